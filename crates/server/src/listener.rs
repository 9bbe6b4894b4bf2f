use std::{
    io,
    pin::Pin,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use axum::Router;
use hyper::{Request, body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::{TokioIo, TokioTimer};
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    net::{TcpListener, TcpStream},
    task::JoinSet,
    time::{Instant, Sleep, sleep, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Pause after a failed `accept` so a full fd table does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Per-connection limits and the shutdown drain window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed for a request's headers to arrive
    pub read: Duration,
    /// Time a response write may stall before the connection is dropped
    pub write: Duration,
    /// Time a keep-alive connection may sit without a request
    pub idle: Duration,
    /// Time in-flight connections get to finish once shutdown starts
    pub shutdown_grace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(15),
            write: Duration::from_secs(15),
            idle: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(15),
        }
    }
}

/// Serves `app` until `shutdown` is cancelled. Open connections are then asked
/// to finish and any still running after `timeouts.shutdown_grace` are aborted.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    timeouts: Timeouts,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {peer}");
                    connections.spawn(serve_connection(
                        stream,
                        app.clone(),
                        timeouts,
                        shutdown.clone(),
                    ));
                }
                Err(err) => {
                    warn!("Failed to accept connection: {err}");
                    sleep(ACCEPT_BACKOFF).await;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    info!("Stopped accepting connections, draining {}", connections.len());

    let drain = async { while connections.join_next().await.is_some() {} };
    if tokio::time::timeout(timeouts.shutdown_grace, drain)
        .await
        .is_err()
    {
        warn!(
            "{} connections still open after {:?}, closing them",
            connections.len(),
            timeouts.shutdown_grace
        );
        connections.shutdown().await;
    }
}

async fn serve_connection(
    stream: TcpStream,
    app: Router,
    timeouts: Timeouts,
    shutdown: CancellationToken,
) {
    let activity = Activity::new();

    let service = {
        let activity = activity.clone();
        service_fn(move |request: Request<Incoming>| {
            let app = app.clone();
            let guard = activity.begin();
            async move {
                let response = app.oneshot(request).await;
                drop(guard);
                response
            }
        })
    };

    let io = TokioIo::new(WriteDeadline::new(stream, timeouts.write));
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read)
        .keep_alive(true);
    let connection = builder.serve_connection(io, service);
    tokio::pin!(connection);

    let mut draining = false;
    loop {
        let idle_deadline = activity.idle_deadline(timeouts.idle);

        tokio::select! {
            result = connection.as_mut() => {
                if let Err(err) = result {
                    debug!("Connection closed with error: {err}");
                }
                return;
            }
            _ = shutdown.cancelled(), if !draining => {
                connection.as_mut().graceful_shutdown();
                draining = true;
            }
            _ = sleep_until(idle_deadline), if !draining => {
                if Instant::now() >= activity.idle_deadline(timeouts.idle) {
                    debug!("Closing connection idle for {:?}", timeouts.idle);
                    connection.as_mut().graceful_shutdown();
                    draining = true;
                }
            }
        }
    }
}

/// Tracks requests in flight on one connection and when it was last busy
#[derive(Clone)]
struct Activity(Arc<ActivityState>);

struct ActivityState {
    in_flight: AtomicUsize,
    last_seen: Mutex<Instant>,
}

struct ActivityGuard(Activity);

impl Activity {
    fn new() -> Self {
        Self(Arc::new(ActivityState {
            in_flight: AtomicUsize::new(0),
            last_seen: Mutex::new(Instant::now()),
        }))
    }

    fn begin(&self) -> ActivityGuard {
        self.0.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        ActivityGuard(self.clone())
    }

    fn touch(&self) {
        *self.0.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// When the connection becomes idle-expired if nothing else happens
    fn idle_deadline(&self, idle: Duration) -> Instant {
        if self.0.in_flight.load(Ordering::SeqCst) > 0 {
            return Instant::now() + idle;
        }
        *self.0.last_seen.lock().unwrap_or_else(PoisonError::into_inner) + idle
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.touch();
        self.0.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fails writes that make no progress for longer than `timeout`
struct WriteDeadline {
    inner: TcpStream,
    timeout: Duration,
    stalled: Option<Pin<Box<Sleep>>>,
}

impl WriteDeadline {
    fn new(inner: TcpStream, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            stalled: None,
        }
    }

    fn track<T>(&mut self, cx: &mut Context<'_>, poll: Poll<io::Result<T>>) -> Poll<io::Result<T>> {
        match poll {
            Poll::Pending => {
                let timeout = self.timeout;
                let stalled = self.stalled.get_or_insert_with(|| Box::pin(sleep(timeout)));
                if stalled.as_mut().poll(cx).is_ready() {
                    self.stalled = None;
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "response write timed out",
                    )));
                }
                Poll::Pending
            }
            ready => {
                self.stalled = None;
                ready
            }
        }
    }
}

impl AsyncRead for WriteDeadline {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for WriteDeadline {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        this.track(cx, poll)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_flush(cx);
        this.track(cx, poll)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

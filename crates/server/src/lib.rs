pub mod answers;
pub mod config;
pub mod doc;
pub mod dtos;
pub mod listener;
pub mod routes;
pub mod utils;

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use database::{db::create_connection, services::interaction::InteractionService};
use log::{error, info};
use migration::{Migrator, MigratorTrait};
use sea_orm::DbErr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};
use utoipa::OpenApi;

use crate::{
    answers::AnswerSelector,
    config::{Config, ConfigError},
    doc::ApiDoc,
    routes::{health, question},
};

pub use crate::listener::{Timeouts, serve};

/// Upper bound on the time spent serving a single request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to open database: {0}")]
    Connection(#[source] DbErr),
    #[error("Failed to migrate database: {0}")]
    Migration(#[source] DbErr),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub interactions: InteractionService,
    pub answers: Arc<AnswerSelector>,
}

impl AppState {
    pub fn new(interactions: InteractionService, answers: AnswerSelector) -> Self {
        Self {
            interactions,
            answers: Arc::new(answers),
        }
    }
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/questions",
            post(question::post_question).get(question::get_questions),
        )
        .route("/health", get(health::health))
        .route("/readiness", get(health::readiness))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                ))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Loads configuration from the environment and runs the service until shutdown
pub async fn start() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    run(config).await
}

pub async fn run(config: Config) -> Result<(), StartupError> {
    let db = create_connection(&config.database_url())
        .await
        .map_err(StartupError::Connection)?;
    Migrator::up(&db, None)
        .await
        .map_err(StartupError::Migration)?;

    let state = AppState::new(InteractionService::new(db.clone()), AnswerSelector::new());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Serving on {addr}");

    let shutdown = CancellationToken::new();
    tokio::spawn(utils::shutdown::shutdown_signal(shutdown.clone()));

    serve(listener, build_router(state), shutdown, Timeouts::default()).await;

    info!("Shutting down");
    if let Err(err) = db.close().await {
        error!("Failed to close database connection: {err}");
    }

    Ok(())
}

use std::process::ExitCode;

use env_logger::Env;
use log::error;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match server::start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("[main] {err}");
            ExitCode::FAILURE
        }
    }
}

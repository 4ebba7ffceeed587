//! Binary entrypoint for the Jaldi generator server.
//!
//! Reads configuration from environment variables:
//! - `JALDI_HOST`: Listen address (default: "0.0.0.0")
//! - `JALDI_PORT`: Listen port (default: "3001")
//! - `JALDI_REPORT_PATH`: Report file path (default: "generated-website-report.txt")

use std::process;

use jaldi_server::config::ServerConfig;
use jaldi_server::router::build_router;
use jaldi_server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let addr = config.bind_addr();
    let state = AppState::new(&config);
    let app = build_router(state);

    tracing::info!(
        report_path = %config.report_path.display(),
        "jaldi server starting on {}",
        addr
    );

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        process::exit(1);
    }
}

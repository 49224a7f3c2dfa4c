//! Passbook server — application entry point.

use tracing_subscriber::EnvFilter;

use passbook_server::app;
use passbook_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("passbook_server=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let router = match app::build(&config) {
        Ok(router) => router,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize store backend");
            std::process::exit(1);
        }
    };

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, backend = ?config.backend, "passbook server listening");

    if let Err(err) = axum::serve(listener, router).await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

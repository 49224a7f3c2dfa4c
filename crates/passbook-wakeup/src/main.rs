//! Wake-up companion service.
//!
//! Free hosting tiers idle out processes that receive no traffic. This
//! binary pairs with a passbook server: it periodically pings the
//! server's `/wake` endpoint and exposes its own `/wake` endpoint so
//! the server (or a second companion) can return the favor. Ping
//! failures are logged and never terminate the process.

use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
struct WakeupConfig {
    port: u16,
    /// Base URL of the peer to keep awake. Absent means serve-only.
    target_url: Option<String>,
    interval: Duration,
}

impl WakeupConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            Err(_) => 3001,
        };

        let interval = match std::env::var("WAKEUP_INTERVAL_SECS") {
            Ok(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                    name: "WAKEUP_INTERVAL_SECS",
                    value,
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(300),
        };

        Ok(Self {
            port,
            target_url: std::env::var("WAKEUP_TARGET_URL").ok(),
            interval,
        })
    }
}

#[derive(Debug, Serialize)]
struct Liveness {
    success: bool,
    message: String,
    time: DateTime<Utc>,
}

async fn wake() -> Json<Liveness> {
    Json(Liveness {
        success: true,
        message: "awake".into(),
        time: Utc::now(),
    })
}

async fn health() -> Json<Liveness> {
    Json(Liveness {
        success: true,
        message: "ok".into(),
        time: Utc::now(),
    })
}

fn wake_url(target: &str) -> String {
    format!("{}/wake", target.trim_end_matches('/'))
}

async fn ping(client: &reqwest::Client, url: &str) {
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!(%url, status = %response.status(), "peer awake");
        }
        Ok(response) => {
            tracing::warn!(%url, status = %response.status(), "peer responded with failure");
        }
        Err(err) => {
            tracing::warn!(%url, error = %err, "ping failed");
        }
    }
}

async fn ping_loop(target_url: String, interval: Duration) {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "failed to build http client, pinger disabled");
            return;
        }
    };
    let url = wake_url(&target_url);

    let mut ticker = tokio::time::interval(interval);
    loop {
        // First tick fires immediately, so the peer is pinged on startup.
        ticker.tick().await;
        ping(&client, &url).await;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("passbook_wakeup=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = match WakeupConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    match &config.target_url {
        Some(target) => {
            tracing::info!(%target, interval_secs = config.interval.as_secs(), "pinger enabled");
            tokio::spawn(ping_loop(target.clone(), config.interval));
        }
        None => tracing::info!("no target configured, serving wake endpoint only"),
    }

    let router = Router::new()
        .route("/wake", get(wake))
        .route("/healthz", get(health));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "wakeup service listening");

    if let Err(err) = axum::serve(listener, router).await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

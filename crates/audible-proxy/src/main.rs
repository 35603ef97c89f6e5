//! Audible integration microservice.
//!
//! A small HTTP service that authenticates against the Audible API on
//! behalf of a web frontend and proxies library and listening-progress
//! data. Upstream tokens are sealed with an authenticated cipher before
//! they leave the process; callers store and replay the sealed values.
//!
//! Configuration is taken from the environment:
//!
//! | Variable         | Meaning                                | Default |
//! |------------------|----------------------------------------|---------|
//! | `ENCRYPTION_KEY` | base64 32-byte token key (required)    | -       |
//! | `API_SECRET`     | shared secret for `X-API-Secret`       | unset   |
//! | `PORT`           | listen port                            | 5000    |
//! | `DEBUG`          | verbose logging when `true`            | false   |

use std::{process::ExitCode, sync::Arc};

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info, warn};

mod config;
mod crypto;
mod error;
mod handlers;
mod locale;
mod models;
mod upstream;

use config::Config;
use crypto::TokenCipher;
use handlers::AppState;
use upstream::HttpAudible;

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth", post(handlers::authenticate))
        .route("/api/library", post(handlers::get_library))
        .route("/api/progress/:asin", post(handlers::get_progress))
        .route("/api/refresh-token", post(handlers::refresh_token))
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"success": false, "error": "Endpoint not found"})),
            )
        })
        .with_state(state)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .init();

    if config.api_secret.is_none() {
        warn!("API_SECRET not set; service will accept unauthenticated requests!");
    }

    let cipher = TokenCipher::new(&config.encryption_key)?;
    let state = Arc::new(AppState {
        cipher,
        api_secret: config.api_secret.clone(),
        upstream: Arc::new(HttpAudible::new()?),
    });

    let app = router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = config.port, "starting Audible integration service");
    info!(api_secret_configured = config.api_secret.is_some());

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "service failed to start");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

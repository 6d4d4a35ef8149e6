//! VibeTrip gateway entry point.
//!
//! Serves the credential-auth REST API, the trip catalog and the per-traveller
//! trip lifecycle (join, commit & pay, check-in release, review). Accounts
//! live in SQLite; trip runtimes and public profiles live in memory.

mod api;
mod auth;
mod catalog;
mod config;
mod db;
mod errors;
mod trips;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use auth::TokenIssuer;
use config::Config;
use trips::TripDesk;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    let desk = TripDesk::new(catalog::default_catalog(), config.intro_period);
    info!(
        "Catalog loaded with {} trips, intro period {}s",
        desk.listings().len(),
        config.intro_period.num_seconds()
    );

    let api_state = Arc::new(api::ApiState {
        pool,
        tokens: TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_secs),
        desk: Arc::new(desk),
    });

    let app = api::router(api_state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS restricted to the configured client origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring unparsable CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

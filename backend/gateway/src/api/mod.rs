//! Axum REST API: shared state, the route table and small shared shapes.

mod auth_routes;
mod trip_routes;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::TokenIssuer;
use crate::db::{self, AccountRecord};
use crate::errors::{ApiError, GatewayError};
use crate::trips::{TripDesk, Traveller};

/// Request bodies up to this size are accepted (documents arrive as data URLs).
pub const BODY_LIMIT_BYTES: usize = 6 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub tokens: TokenIssuer,
    pub desk: Arc<TripDesk>,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Account fields safe to hand to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub is_verified: bool,
}

impl From<&AccountRecord> for PublicUser {
    fn from(account: &AccountRecord) -> Self {
        Self {
            id: account.id.clone(),
            user_id: account.user_id.clone(),
            provider: account.provider.clone(),
            is_verified: account.is_verified,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ─────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────

/// Build the route table. CORS and tracing layers are added by the caller.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth_routes::register))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/verify-document", post(auth_routes::verify_document))
        .route("/api/profile", get(auth_routes::get_profile))
        .route("/api/profile/dna", put(auth_routes::put_travel_dna))
        .route("/api/trips", get(trip_routes::list_trips))
        .route("/api/trips/:id", get(trip_routes::get_trip))
        .route("/api/trips/:id/join", post(trip_routes::join_trip))
        .route("/api/trips/:id/commit", post(trip_routes::commit_trip))
        .route("/api/trips/:id/check-in", post(trip_routes::check_in_trip))
        .route("/api/trips/:id/review", post(trip_routes::review_trip))
        .route("/api/hosts", get(trip_routes::list_hosts))
        .route("/api/wallet", get(trip_routes::get_wallet))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

/// `GET /api/health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─────────────────────────────────────────────────────────
// Shared helpers
// ─────────────────────────────────────────────────────────

const GENERIC_FAILURE: &str = "Unable to process request right now.";

/// Unwrap an optional JSON body. An oversized body stays `413`; any other
/// rejection reads as "no usable body" so each route names what is missing.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<Option<T>, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(Some(body)),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(
            ApiError::PayloadTooLarge("Request body exceeds 6MB limit.".to_string()),
        ),
        Err(_) => Ok(None),
    }
}

/// Load the account behind a session, or `404` if it no longer exists.
async fn session_account(state: &ApiState, account_id: &str) -> Result<AccountRecord, ApiError> {
    db::find_by_id(&state.pool, account_id)
        .await
        .map_err(ApiError::internal(GENERIC_FAILURE))?
        .ok_or_else(|| ApiError::NotFound("User account not found.".to_string()))
}

fn traveller_from(account: &AccountRecord) -> Result<Traveller, GatewayError> {
    Ok(Traveller {
        account_id: account.id.clone(),
        name: account.user_id.clone(),
        is_verified: account.is_verified,
        dna: account.travel_dna()?,
    })
}

//! Catalog, trip lifecycle, host and wallet endpoints.
//!
//! Lifecycle calls answer `200` whether or not the event was accepted. A
//! guard refusal comes back as `applied: false` with a `notice`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use trip_protocol::{match_score, Effect, Notice, Outcome, PublicProfile, Rating, Transition};

use super::{json_body, session_account, traveller_from, ApiState, GENERIC_FAILURE};
use crate::auth::{MaybeSession, Session};
use crate::catalog::TripListing;
use crate::db;
use crate::errors::ApiError;
use crate::trips::{Traveller, TripAction, TripRuntimeView, WalletSummary};

const TRIP_NOT_FOUND: &str = "Trip not found.";

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub organizer_rating: Option<i64>,
    pub traveler_rating: Option<i64>,
}

/// A catalog entry, scored against the caller when they have DNA.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: TripListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetail {
    #[serde(flatten)]
    pub listing: ScoredListing,
    pub runtime: TripRuntimeView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    pub applied: bool,
    pub notice: Option<Notice>,
    pub message: &'static str,
    pub effect: Option<Effect>,
    pub trip: TripRuntimeView,
}

impl From<Transition> for LifecycleResponse {
    fn from(transition: Transition) -> Self {
        let trip = TripRuntimeView::from(&transition.state);
        match transition.outcome {
            Outcome::Applied(effect) => Self {
                applied: true,
                notice: None,
                message: effect.message(),
                effect: Some(effect),
                trip,
            },
            Outcome::Rejected(notice) => Self {
                applied: false,
                notice: Some(notice),
                message: notice.message(),
                effect: None,
                trip,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /api/trips`
pub async fn list_trips(
    State(state): State<Arc<ApiState>>,
    MaybeSession(claims): MaybeSession,
) -> Result<Json<Vec<ScoredListing>>, ApiError> {
    let traveller = match claims {
        Some(claims) => optional_traveller(&state, &claims.sub).await?,
        None => None,
    };

    let listings = state
        .desk
        .listings()
        .iter()
        .map(|listing| scored(listing, traveller.as_ref()))
        .collect();
    Ok(Json(listings))
}

/// `GET /api/trips/:id`
pub async fn get_trip(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
    Path(trip_id): Path<String>,
) -> Result<Json<TripDetail>, ApiError> {
    let listing = state
        .desk
        .listing(&trip_id)
        .ok_or_else(trip_not_found)?;
    let traveller = session_traveller(&state, &claims.sub).await?;
    let runtime = state.desk.state_of(&traveller.account_id, &trip_id).await;

    Ok(Json(TripDetail {
        listing: scored(listing, Some(&traveller)),
        runtime: TripRuntimeView::from(&runtime),
    }))
}

/// `POST /api/trips/:id/join`
///
/// A caller without a valid session is still run through the lifecycle so
/// they get the same sign-in notice as every other refusal.
pub async fn join_trip(
    State(state): State<Arc<ApiState>>,
    MaybeSession(claims): MaybeSession,
    Path(trip_id): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    let Some(claims) = claims else {
        state.desk.listing(&trip_id).ok_or_else(trip_not_found)?;
        return Ok(Json(state.desk.join_signed_out(Utc::now()).into()));
    };
    dispatch(&state, &claims.sub, &trip_id, TripAction::JoinChat).await
}

/// `POST /api/trips/:id/commit`
pub async fn commit_trip(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
    Path(trip_id): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    dispatch(&state, &claims.sub, &trip_id, TripAction::CommitAndPay).await
}

/// `POST /api/trips/:id/check-in`
pub async fn check_in_trip(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
    Path(trip_id): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    dispatch(&state, &claims.sub, &trip_id, TripAction::ReleaseCheckInFunds).await
}

/// `POST /api/trips/:id/review`
pub async fn review_trip(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
    Path(trip_id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    let action = review_action(json_body(payload)?)?;
    dispatch(&state, &claims.sub, &trip_id, action).await
}

/// `GET /api/hosts`
pub async fn list_hosts(State(state): State<Arc<ApiState>>) -> Json<Vec<PublicProfile>> {
    Json(state.desk.host_profiles().await)
}

/// `GET /api/wallet`
pub async fn get_wallet(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
) -> Json<WalletSummary> {
    Json(state.desk.wallet(&claims.sub).await)
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

fn trip_not_found() -> ApiError {
    ApiError::NotFound(TRIP_NOT_FOUND.to_string())
}

fn scored(listing: &TripListing, traveller: Option<&Traveller>) -> ScoredListing {
    ScoredListing {
        listing: listing.clone(),
        match_score: traveller
            .and_then(|t| t.dna.as_ref())
            .map(|dna| match_score(dna, &listing.dna)),
    }
}

async fn optional_traveller(state: &ApiState, account_id: &str) -> Result<Option<Traveller>, ApiError> {
    let account = db::find_by_id(&state.pool, account_id)
        .await
        .map_err(ApiError::internal(GENERIC_FAILURE))?;
    account
        .as_ref()
        .map(traveller_from)
        .transpose()
        .map_err(ApiError::internal(GENERIC_FAILURE))
}

async fn session_traveller(state: &ApiState, account_id: &str) -> Result<Traveller, ApiError> {
    let account = session_account(state, account_id).await?;
    traveller_from(&account).map_err(ApiError::internal(GENERIC_FAILURE))
}

fn review_action(body: Option<ReviewRequest>) -> Result<TripAction, ApiError> {
    let invalid = || ApiError::validation("Ratings must be whole numbers from 1 to 5.");
    let Some(ReviewRequest {
        organizer_rating: Some(organizer),
        traveler_rating: Some(traveler),
    }) = body
    else {
        return Err(invalid());
    };

    Ok(TripAction::SubmitReview {
        organizer: Rating::new(organizer).map_err(|_| invalid())?,
        traveler: Rating::new(traveler).map_err(|_| invalid())?,
    })
}

async fn dispatch(
    state: &ApiState,
    account_id: &str,
    trip_id: &str,
    action: TripAction,
) -> Result<Json<LifecycleResponse>, ApiError> {
    state.desk.listing(trip_id).ok_or_else(trip_not_found)?;
    let traveller = session_traveller(state, account_id).await?;
    let transition = state
        .desk
        .dispatch(&traveller, trip_id, action, Utc::now())
        .await
        .ok_or_else(trip_not_found)?;
    Ok(Json(transition.into()))
}

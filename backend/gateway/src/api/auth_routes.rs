//! Credential and profile endpoints.
//!
//! - `POST /api/auth/register`: create an email account
//! - `POST /api/auth/login`: exchange credentials for a session token
//! - `POST /api/auth/verify-document`: attach ID metadata and mark the account verified
//! - `GET  /api/profile`: the caller's account, DNA and reputation
//! - `PUT  /api/profile/dna`: complete onboarding

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use trip_protocol::{PublicProfile, TravelDna};

use super::{
    json_body, session_account, traveller_from, ApiState, MessageResponse, PublicUser,
    GENERIC_FAILURE,
};
use crate::auth::{hash_password, verify_password, Session};
use crate::db::{self, VerificationDocument};
use crate::errors::ApiError;

pub const MIN_USER_ID_CHARS: usize = 3;
pub const MAX_USER_ID_CHARS: usize = 32;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_DOCUMENT_SIZE_BYTES: f64 = (5 * 1024 * 1024) as f64;

const REGISTER_FAILURE: &str = "Unable to register user right now.";
const LOGIN_FAILURE: &str = "Unable to log in right now.";
const DOCUMENT_FAILURE: &str = "Unable to process document right now.";

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

/// Fields are optional so a missing field and a wrongly typed one get the same 400.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub user_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDocumentRequest {
    pub document_name: Option<String>,
    pub mime_type: Option<String>,
    pub document_data_url: Option<String>,
    pub document_size: Option<f64>,
}

pub type TravelDnaRequest = TravelDna;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct VerifyDocumentResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: PublicUser,
    #[serde(rename = "dna")]
    pub travel_dna: Option<TravelDna>,
    pub onboarded: bool,
    pub profile: PublicProfile,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = register_account(&state, json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    login_account(&state, json_body(payload)?)
        .await
        .map(Json)
}

/// `POST /api/auth/verify-document`
pub async fn verify_document(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
    payload: Result<Json<VerifyDocumentRequest>, JsonRejection>,
) -> Result<Json<VerifyDocumentResponse>, ApiError> {
    verify_account_document(&state, &claims.sub, json_body(payload)?)
        .await
        .map(Json)
}

/// `GET /api/profile`
pub async fn get_profile(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = session_account(&state, &claims.sub).await?;
    profile_response(&state, &account).await.map(Json)
}

/// `PUT /api/profile/dna`
pub async fn put_travel_dna(
    State(state): State<Arc<ApiState>>,
    Session(claims): Session,
    payload: Result<Json<TravelDnaRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(dna) = json_body(payload)? else {
        return Err(ApiError::validation(
            "Travel DNA needs socialEnergy, budgetRange and pace (Active or Chill).",
        ));
    };
    save_dna(&state, &claims.sub, &dna).await.map(Json)
}

// ─────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────

fn required_credentials(body: Option<CredentialsRequest>) -> Result<(String, String), ApiError> {
    match body {
        Some(CredentialsRequest {
            user_id: Some(user_id),
            password: Some(password),
        }) => Ok((user_id.trim().to_string(), password)),
        _ => Err(ApiError::validation("User ID and password are required.")),
    }
}

pub async fn register_account(
    state: &ApiState,
    body: Option<CredentialsRequest>,
) -> Result<MessageResponse, ApiError> {
    let (user_id, password) = required_credentials(body)?;

    let length = user_id.chars().count();
    if length < MIN_USER_ID_CHARS {
        return Err(ApiError::validation("User ID must be at least 3 characters."));
    }
    if length > MAX_USER_ID_CHARS {
        return Err(ApiError::validation("User ID must be at most 32 characters."));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::validation("Password must be at least 6 characters."));
    }

    let conflict = || ApiError::Conflict("User ID already exists.".to_string());

    if db::find_by_user_id(&state.pool, &user_id)
        .await
        .map_err(ApiError::internal(REGISTER_FAILURE))?
        .is_some()
    {
        return Err(conflict());
    }

    let password_hash = hash_password(password)
        .await
        .map_err(ApiError::internal(REGISTER_FAILURE))?;

    match db::insert_account(&state.pool, &user_id, &password_hash).await {
        Ok(id) => {
            info!("Registered account {id} ({user_id})");
            Ok(MessageResponse {
                message: "Account created successfully.",
            })
        }
        // Lost a race with a concurrent registration of the same id.
        Err(e) if db::is_unique_violation(&e) => Err(conflict()),
        Err(e) => Err(ApiError::internal(REGISTER_FAILURE)(e)),
    }
}

pub async fn login_account(
    state: &ApiState,
    body: Option<CredentialsRequest>,
) -> Result<LoginResponse, ApiError> {
    let (user_id, password) = required_credentials(body)?;

    let account = db::find_by_user_id(&state.pool, &user_id)
        .await
        .map_err(ApiError::internal(LOGIN_FAILURE))?
        .ok_or(ApiError::InvalidCredentials)?;

    let matches = verify_password(password, account.password_hash.clone())
        .await
        .map_err(ApiError::internal(LOGIN_FAILURE))?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(&account)
        .map_err(ApiError::internal(LOGIN_FAILURE))?;

    Ok(LoginResponse {
        token,
        user: PublicUser::from(&account),
    })
}

fn validate_document(body: Option<VerifyDocumentRequest>) -> Result<VerificationDocument, ApiError> {
    let Some(VerifyDocumentRequest {
        document_name: Some(name),
        mime_type: Some(mime_type),
        document_data_url: Some(data_url),
        document_size: Some(size),
    }) = body
    else {
        return Err(ApiError::validation("Document payload is incomplete."));
    };

    let name = name.trim();
    let mime_type = mime_type.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Document name is required."));
    }
    if mime_type.is_empty() {
        return Err(ApiError::validation("Document type is required."));
    }
    if !data_url.starts_with("data:") {
        return Err(ApiError::validation("Invalid document format."));
    }
    if !size.is_finite() || size <= 0.0 {
        return Err(ApiError::validation("Invalid document size."));
    }
    if size > MAX_DOCUMENT_SIZE_BYTES {
        return Err(ApiError::PayloadTooLarge(
            "Document size exceeds 5MB limit.".to_string(),
        ));
    }

    Ok(VerificationDocument {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        size,
    })
}

pub async fn verify_account_document(
    state: &ApiState,
    account_id: &str,
    body: Option<VerifyDocumentRequest>,
) -> Result<VerifyDocumentResponse, ApiError> {
    let document = validate_document(body)?;

    let updated = db::mark_verified(&state.pool, account_id, &document)
        .await
        .map_err(ApiError::internal(DOCUMENT_FAILURE))?;
    if !updated {
        return Err(ApiError::NotFound("User account not found.".to_string()));
    }

    let account = db::find_by_id(&state.pool, account_id)
        .await
        .map_err(ApiError::internal(DOCUMENT_FAILURE))?
        .ok_or_else(|| ApiError::NotFound("User account not found.".to_string()))?;

    info!(
        "Account {account_id} verified with {} ({} bytes)",
        document.mime_type, document.size
    );
    Ok(VerifyDocumentResponse {
        message: "Document uploaded and profile verified.",
        user: PublicUser::from(&account),
    })
}

async fn save_dna(
    state: &ApiState,
    account_id: &str,
    dna: &TravelDna,
) -> Result<ProfileResponse, ApiError> {
    if !dna.social_energy.is_finite() || !dna.budget_range.is_finite() {
        return Err(ApiError::validation("Travel DNA values must be numbers."));
    }

    let updated = db::save_travel_dna(&state.pool, account_id, dna)
        .await
        .map_err(ApiError::internal(GENERIC_FAILURE))?;
    if !updated {
        return Err(ApiError::NotFound("User account not found.".to_string()));
    }

    let account = db::find_by_id(&state.pool, account_id)
        .await
        .map_err(ApiError::internal(GENERIC_FAILURE))?
        .ok_or_else(|| ApiError::NotFound("User account not found.".to_string()))?;
    profile_response(state, &account).await
}

async fn profile_response(
    state: &ApiState,
    account: &db::AccountRecord,
) -> Result<ProfileResponse, ApiError> {
    let traveller = traveller_from(account).map_err(ApiError::internal(GENERIC_FAILURE))?;
    let profile = state.desk.traveller_profile(&traveller).await;
    Ok(ProfileResponse {
        user: PublicUser::from(account),
        onboarded: traveller.dna.is_some(),
        travel_dna: traveller.dna,
        profile,
    })
}

//! Credential authentication: password hashing, session tokens and the
//! request extractors that turn a bearer header into a session.

mod password;
mod token;

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

pub use password::{hash_password, verify_password};
pub use token::{bearer_token, Claims, TokenIssuer};

use crate::api::ApiState;
use crate::errors::ApiError;

fn claims_from_parts(parts: &Parts, state: &ApiState) -> Option<Claims> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    bearer_token(header).and_then(|token| state.tokens.verify(token))
}

/// A verified session. Rejects with `401` when the token is missing or invalid.
#[derive(Debug, Clone)]
pub struct Session(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state)
            .map(Session)
            .ok_or(ApiError::Unauthorized)
    }
}

/// A session if one was presented; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Claims>);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(claims_from_parts(parts, state)))
    }
}

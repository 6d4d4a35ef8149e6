//! Domain validation errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Rating must be between {min} and {max}, got {got}")]
    InvalidRating { min: u8, max: u8, got: i64 },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

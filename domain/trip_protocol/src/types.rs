//! # Types
//!
//! Shared data structures used across all modules of the trip protocol.
//!
//! ## Design decisions
//!
//! ### DNA is one shape for both sides
//!
//! A traveller's onboarding answers and a trip's target vibe are the same
//! three-axis vector, so both use [`TravelDna`]. Slider values are kept as
//! entered; clamping happens in [`crate::scoring`] at the point of use.
//!
//! ### Status as a tagged union
//!
//! [`TripState`] carries the data each phase owns, so the flags that would
//! otherwise sit beside a bare status (intro deadline, escrow, "funds
//! released", "has reviewed") cannot disagree with it:
//!
//! ```text
//! Open ──► Introductory ──► Locked ──► Completed
//! ```
//!
//! Backward transitions and transitions out of `Completed` are rejected by
//! [`crate::lifecycle::apply`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Preferred travel tempo.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TravelPace {
    Active,
    Chill,
}

impl TravelPace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Chill => "Chill",
        }
    }

    /// Parse the stored pace label. Unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Self::Active),
            "Chill" => Some(Self::Chill),
            _ => None,
        }
    }
}

/// Preference vector shared by travellers and trips.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDna {
    /// How social the trip should be, 1 (quiet) to 10 (party).
    pub social_energy: f64,
    /// Budget comfort level, 1 (shoestring) to 10 (luxury).
    pub budget_range: f64,
    pub pace: TravelPace,
}

impl Default for TravelDna {
    fn default() -> Self {
        Self {
            social_energy: 5.0,
            budget_range: 5.0,
            pace: TravelPace::Active,
        }
    }
}

/// Flat status label derived from [`TripState`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TripLifecycleStatus {
    /// Listed; nobody from this participation has joined the chat.
    Open,
    /// Chat joined; payment blocked until the intro period ends.
    Introductory,
    /// Paid into escrow.
    Locked,
    /// Reviewed. Terminal.
    Completed,
}

/// Money held by the platform for a single trip participation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub base_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub released_to_organizer: Decimal,
}

/// Runtime state of one traveller's participation in one trip.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TripState {
    #[default]
    Open,
    Introductory {
        intro_ends_at: DateTime<Utc>,
    },
    Locked {
        escrow: EscrowSummary,
        funds_released: bool,
    },
    Completed {
        escrow: EscrowSummary,
        funds_released: bool,
    },
}

impl TripState {
    pub fn status(&self) -> TripLifecycleStatus {
        match self {
            Self::Open => TripLifecycleStatus::Open,
            Self::Introductory { .. } => TripLifecycleStatus::Introductory,
            Self::Locked { .. } => TripLifecycleStatus::Locked,
            Self::Completed { .. } => TripLifecycleStatus::Completed,
        }
    }

    pub fn intro_ends_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Introductory { intro_ends_at } => Some(*intro_ends_at),
            _ => None,
        }
    }

    pub fn escrow(&self) -> Option<&EscrowSummary> {
        match self {
            Self::Locked { escrow, .. } | Self::Completed { escrow, .. } => Some(escrow),
            _ => None,
        }
    }

    pub fn funds_released(&self) -> bool {
        match self {
            Self::Locked { funds_released, .. } | Self::Completed { funds_released, .. } => {
                *funds_released
            }
            _ => false,
        }
    }

    pub fn has_reviewed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Running star-rating average.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub average: Decimal,
    pub count: u32,
}

/// Public reputation card shown for organizers and travellers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub name: String,
    pub tours_completed: u32,
    #[serde(flatten)]
    pub rating: RatingSummary,
    pub is_verified: bool,
}

impl PublicProfile {
    /// A traveller with no history.
    pub fn newcomer(name: impl Into<String>, is_verified: bool) -> Self {
        Self {
            name: name.into(),
            tours_completed: 0,
            rating: RatingSummary::default(),
            is_verified,
        }
    }
}

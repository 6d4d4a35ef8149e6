//! # Trip Protocol
//!
//! Domain rules of **VibeTrip**, a group-travel matchmaking platform. The
//! crate is pure and synchronous: callers own every piece of state and pass
//! it in and out.
//!
//! | Concern              | Entry Point(s)                                      |
//! |----------------------|-----------------------------------------------------|
//! | Matchmaking          | [`scoring::match_score`]                            |
//! | Escrow maths         | [`escrow::compute_escrow_summary`], [`escrow::release_check_in_funds`] |
//! | Wallet totals        | [`escrow::EscrowLedger`]                            |
//! | Trip lifecycle       | [`lifecycle::apply`]                                |
//! | Reputation           | [`rating::RatingSummary::record`], [`PublicProfile::record_tour`] |
//!
//! ## Architecture
//!
//! [`lifecycle`] is the only module with transitions; it calls into
//! [`escrow`] for the money on entering `Locked` and at check-in, and into
//! [`scoring`] when assessing an applicant. Services that share state
//! across requests must serialise calls to [`lifecycle::apply`] per trip
//! participation and rating updates per profile.

pub mod error;
pub mod escrow;
pub mod lifecycle;
pub mod rating;
pub mod scoring;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_lifecycle;

pub use error::ProtocolError;
pub use escrow::{compute_escrow_summary, release_check_in_funds, EscrowLedger};
pub use lifecycle::{apply, Applicant, Effect, LifecycleClock, Notice, Outcome, Transition, TripEvent};
pub use rating::Rating;
pub use scoring::match_score;
pub use types::{
    EscrowSummary, PublicProfile, RatingSummary, TravelDna, TravelPace, TripLifecycleStatus,
    TripState,
};

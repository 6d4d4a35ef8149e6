//! # Lifecycle
//!
//! The whole trip-participation state machine lives in [`apply`]. Every
//! guard is checked here; callers only hold the current [`TripState`] and
//! feed events in.
//!
//! | From             | Event                 | Guard                                   | To           |
//! |------------------|-----------------------|-----------------------------------------|--------------|
//! | Open             | `JoinChat`            | signed in, onboarded, verified, score > 70 | Introductory |
//! | Introductory     | `CommitAndPay`        | intro period elapsed                    | Locked       |
//! | Locked/Completed | `ReleaseCheckInFunds` | not yet released                        | (same)       |
//! | Locked           | `SubmitReview`        | -                                       | Completed    |
//!
//! A failed guard never errors: it yields [`Outcome::Rejected`] with a
//! [`Notice`] and hands back the prior state untouched.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::escrow::{compute_escrow_summary, release_check_in_funds};
use crate::rating::Rating;
use crate::scoring::match_score;
use crate::types::{EscrowSummary, TravelDna, TripState};

/// A match score must be strictly above this to join a group chat.
pub const JOIN_SCORE_THRESHOLD: u8 = 70;

/// Default cooling-off window between joining and paying.
pub const DEFAULT_INTRO_PERIOD_SECS: i64 = 24 * 60 * 60;

/// Time source for deadline checks.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleClock {
    pub now: DateTime<Utc>,
    pub intro_period: Duration,
}

impl LifecycleClock {
    pub fn new(now: DateTime<Utc>, intro_period: Duration) -> Self {
        Self { now, intro_period }
    }

    /// End of an intro period starting now. Saturates at the latest
    /// representable instant instead of overflowing.
    pub fn intro_deadline(&self) -> DateTime<Utc> {
        self.now
            .checked_add_signed(self.intro_period)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// What the lifecycle needs to know about someone asking to join a chat.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Applicant {
    pub signed_in: bool,
    pub onboarded: bool,
    pub verified: bool,
    pub match_score: u8,
}

impl Applicant {
    pub fn signed_out() -> Self {
        Self {
            signed_in: false,
            onboarded: false,
            verified: false,
            match_score: 0,
        }
    }

    /// A signed-in traveller, scored against the trip's DNA when onboarded.
    pub fn assess(dna: Option<&TravelDna>, verified: bool, trip_dna: &TravelDna) -> Self {
        Self {
            signed_in: true,
            onboarded: dna.is_some(),
            verified,
            match_score: dna.map(|dna| match_score(dna, trip_dna)).unwrap_or(0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TripEvent {
    JoinChat(Applicant),
    CommitAndPay { price_share: Decimal },
    ReleaseCheckInFunds,
    SubmitReview { organizer: Rating, traveler: Rating },
}

/// Side effect of an accepted event, for the caller to act on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    ChatJoined {
        intro_ends_at: DateTime<Utc>,
    },
    EscrowLocked {
        escrow: EscrowSummary,
    },
    FundsReleased {
        #[serde(with = "rust_decimal::serde::float")]
        amount: Decimal,
    },
    Reviewed {
        organizer: Rating,
        traveler: Rating,
    },
}

impl Effect {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ChatJoined { .. } => "Welcome to the group chat. The intro period has started.",
            Self::EscrowLocked { .. } => "Escrow payment complete. Trip is now locked.",
            Self::FundsReleased { .. } => "Check-in confirmed. 50% of funds released to organizer.",
            Self::Reviewed { .. } => "Review submitted. Tours completed and ratings updated.",
        }
    }
}

/// Why an event was turned down.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    SignInRequired,
    OnboardingRequired,
    VerificationRequired,
    MatchScoreTooLow,
    AlreadyJoined,
    NotIntroductory,
    IntroPeriodActive,
    NoEscrow,
    FundsAlreadyReleased,
    TripNotLocked,
    ReviewAlreadySubmitted,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::SignInRequired => "Sign in to join trip chat.",
            Self::OnboardingRequired => "Complete onboarding to unlock matchmaking.",
            Self::VerificationRequired => "Verification is required before joining chat.",
            Self::MatchScoreTooLow => "You need a match score above 70% to join this group chat.",
            Self::AlreadyJoined => "You have already joined this trip.",
            Self::NotIntroductory => "Commit & Pay is only available during the intro stage.",
            Self::IntroPeriodActive => {
                "Commit & Pay stays locked during the 24-hour intro period."
            }
            Self::NoEscrow => "No escrow payment to release yet.",
            Self::FundsAlreadyReleased => "Check-in funds have already been released.",
            Self::TripNotLocked => "Reviews open once the trip is paid and locked.",
            Self::ReviewAlreadySubmitted => "Review has already been submitted for this trip.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    Applied(Effect),
    Rejected(Notice),
}

/// Result of [`apply`]: the state to keep and what happened.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: TripState,
    pub outcome: Outcome,
}

impl Transition {
    fn applied(state: TripState, effect: Effect) -> Self {
        Self {
            state,
            outcome: Outcome::Applied(effect),
        }
    }

    fn rejected(state: &TripState, notice: Notice) -> Self {
        Self {
            state: state.clone(),
            outcome: Outcome::Rejected(notice),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied(_))
    }

    pub fn notice(&self) -> Option<Notice> {
        match self.outcome {
            Outcome::Rejected(notice) => Some(notice),
            Outcome::Applied(_) => None,
        }
    }
}

/// Apply `event` to `state`.
pub fn apply(state: &TripState, event: TripEvent, clock: &LifecycleClock) -> Transition {
    match event {
        TripEvent::JoinChat(applicant) => join_chat(state, applicant, clock),
        TripEvent::CommitAndPay { price_share } => commit_and_pay(state, price_share, clock),
        TripEvent::ReleaseCheckInFunds => release_funds(state),
        TripEvent::SubmitReview {
            organizer,
            traveler,
        } => submit_review(state, organizer, traveler),
    }
}

fn join_chat(state: &TripState, applicant: Applicant, clock: &LifecycleClock) -> Transition {
    let guard = if !applicant.signed_in {
        Some(Notice::SignInRequired)
    } else if !applicant.onboarded {
        Some(Notice::OnboardingRequired)
    } else if !applicant.verified {
        Some(Notice::VerificationRequired)
    } else if applicant.match_score <= JOIN_SCORE_THRESHOLD {
        Some(Notice::MatchScoreTooLow)
    } else {
        None
    };
    if let Some(notice) = guard {
        return Transition::rejected(state, notice);
    }

    match state {
        TripState::Open => {
            let intro_ends_at = clock.intro_deadline();
            Transition::applied(
                TripState::Introductory { intro_ends_at },
                Effect::ChatJoined { intro_ends_at },
            )
        }
        _ => Transition::rejected(state, Notice::AlreadyJoined),
    }
}

fn commit_and_pay(state: &TripState, price_share: Decimal, clock: &LifecycleClock) -> Transition {
    let TripState::Introductory { intro_ends_at } = state else {
        return Transition::rejected(state, Notice::NotIntroductory);
    };
    if *intro_ends_at > clock.now {
        return Transition::rejected(state, Notice::IntroPeriodActive);
    }

    let escrow = compute_escrow_summary(price_share);
    Transition::applied(
        TripState::Locked {
            escrow,
            funds_released: false,
        },
        Effect::EscrowLocked { escrow },
    )
}

fn release_funds(state: &TripState) -> Transition {
    match state {
        TripState::Open | TripState::Introductory { .. } => {
            Transition::rejected(state, Notice::NoEscrow)
        }
        TripState::Locked {
            funds_released: true,
            ..
        }
        | TripState::Completed {
            funds_released: true,
            ..
        } => Transition::rejected(state, Notice::FundsAlreadyReleased),
        TripState::Locked { escrow, .. } => {
            let escrow = release_check_in_funds(escrow);
            Transition::applied(
                TripState::Locked {
                    escrow,
                    funds_released: true,
                },
                Effect::FundsReleased {
                    amount: escrow.released_to_organizer,
                },
            )
        }
        TripState::Completed { escrow, .. } => {
            let escrow = release_check_in_funds(escrow);
            Transition::applied(
                TripState::Completed {
                    escrow,
                    funds_released: true,
                },
                Effect::FundsReleased {
                    amount: escrow.released_to_organizer,
                },
            )
        }
    }
}

fn submit_review(state: &TripState, organizer: Rating, traveler: Rating) -> Transition {
    match state {
        TripState::Completed { .. } => Transition::rejected(state, Notice::ReviewAlreadySubmitted),
        TripState::Open | TripState::Introductory { .. } => {
            Transition::rejected(state, Notice::TripNotLocked)
        }
        TripState::Locked {
            escrow,
            funds_released,
        } => Transition::applied(
            TripState::Completed {
                escrow: *escrow,
                funds_released: *funds_released,
            },
            Effect::Reviewed {
                organizer,
                traveler,
            },
        ),
    }
}

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use crate::invariants::{assert_all_state_invariants, assert_step};
use crate::lifecycle::{apply, Applicant, Effect, LifecycleClock, Notice, Outcome, TripEvent};
use crate::rating::Rating;
use crate::types::{TravelDna, TravelPace, TripLifecycleStatus, TripState};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn clock_at(now: DateTime<Utc>) -> LifecycleClock {
    LifecycleClock::new(now, Duration::hours(24))
}

fn qualified(score: u8) -> Applicant {
    Applicant {
        signed_in: true,
        onboarded: true,
        verified: true,
        match_score: score,
    }
}

fn step(state: &TripState, event: TripEvent, clock: &LifecycleClock) -> (TripState, Outcome) {
    let transition = apply(state, event, clock);
    assert_step(state, &transition.state);
    if !transition.is_applied() {
        assert_eq!(&transition.state, state, "rejection must not change state");
    }
    (transition.state, transition.outcome)
}

fn review(organizer: i64, traveler: i64) -> TripEvent {
    TripEvent::SubmitReview {
        organizer: Rating::new(organizer).unwrap(),
        traveler: Rating::new(traveler).unwrap(),
    }
}

#[test]
fn test_full_trip_lifecycle() {
    let t0 = start();
    let state = TripState::Open;
    assert_eq!(state.status(), TripLifecycleStatus::Open);

    // Join with score 72.
    let (state, outcome) = step(&state, TripEvent::JoinChat(qualified(72)), &clock_at(t0));
    assert_eq!(state.status(), TripLifecycleStatus::Introductory);
    let intro_ends_at = state.intro_ends_at().unwrap();
    assert_eq!(intro_ends_at, t0 + Duration::hours(24));
    assert_eq!(outcome, Outcome::Applied(Effect::ChatJoined { intro_ends_at }));

    // Paying straight away is blocked.
    let commit = TripEvent::CommitAndPay {
        price_share: dec!(420),
    };
    let (state, outcome) = step(&state, commit, &clock_at(t0 + Duration::minutes(1)));
    assert_eq!(outcome, Outcome::Rejected(Notice::IntroPeriodActive));
    assert_eq!(state.status(), TripLifecycleStatus::Introductory);

    // After the deadline it locks with an escrow summary.
    let later = t0 + Duration::hours(25);
    let (state, outcome) = step(&state, commit, &clock_at(later));
    assert_eq!(state.status(), TripLifecycleStatus::Locked);
    let escrow = *state.escrow().unwrap();
    assert_eq!(escrow.total_amount, dec!(441.00));
    assert_eq!(outcome, Outcome::Applied(Effect::EscrowLocked { escrow }));

    // Check-in releases half, once.
    let (state, outcome) = step(&state, TripEvent::ReleaseCheckInFunds, &clock_at(later));
    assert_eq!(
        outcome,
        Outcome::Applied(Effect::FundsReleased {
            amount: dec!(220.50)
        })
    );
    assert!(state.funds_released());
    assert_eq!(state.escrow().unwrap().released_to_organizer, dec!(220.50));

    let (state, outcome) = step(&state, TripEvent::ReleaseCheckInFunds, &clock_at(later));
    assert_eq!(outcome, Outcome::Rejected(Notice::FundsAlreadyReleased));
    assert_eq!(state.escrow().unwrap().released_to_organizer, dec!(220.50));

    // Review completes the trip, exactly once.
    let (state, outcome) = step(&state, review(5, 4), &clock_at(later));
    assert_eq!(state.status(), TripLifecycleStatus::Completed);
    assert!(state.has_reviewed());
    assert!(matches!(outcome, Outcome::Applied(Effect::Reviewed { .. })));

    let (state, outcome) = step(&state, review(1, 1), &clock_at(later));
    assert_eq!(outcome, Outcome::Rejected(Notice::ReviewAlreadySubmitted));
    assert_eq!(
        Notice::ReviewAlreadySubmitted.message(),
        "Review has already been submitted for this trip."
    );
    assert_all_state_invariants(&state);
}

#[test]
fn test_commit_allowed_exactly_at_deadline() {
    let t0 = start();
    let (state, _) = step(
        &TripState::Open,
        TripEvent::JoinChat(qualified(90)),
        &clock_at(t0),
    );
    let (state, outcome) = step(
        &state,
        TripEvent::CommitAndPay {
            price_share: dec!(100),
        },
        &clock_at(t0 + Duration::hours(24)),
    );
    assert!(matches!(outcome, Outcome::Applied(Effect::EscrowLocked { .. })));
    assert_eq!(state.escrow().unwrap().total_amount, dec!(105.00));
}

#[test]
fn test_join_guards_in_order() {
    let clock = clock_at(start());
    let cases = [
        (Applicant::signed_out(), Notice::SignInRequired),
        (
            Applicant {
                onboarded: false,
                verified: false,
                ..qualified(95)
            },
            Notice::OnboardingRequired,
        ),
        (
            Applicant {
                verified: false,
                ..qualified(95)
            },
            Notice::VerificationRequired,
        ),
        (qualified(70), Notice::MatchScoreTooLow),
        (qualified(12), Notice::MatchScoreTooLow),
    ];

    for (applicant, expected) in cases {
        let (state, outcome) = step(&TripState::Open, TripEvent::JoinChat(applicant), &clock);
        assert_eq!(outcome, Outcome::Rejected(expected));
        assert_eq!(state, TripState::Open);
    }

    let (state, _) = step(&TripState::Open, TripEvent::JoinChat(qualified(71)), &clock);
    assert_eq!(state.status(), TripLifecycleStatus::Introductory);
}

#[test]
fn test_second_join_keeps_original_deadline() {
    let t0 = start();
    let (state, _) = step(
        &TripState::Open,
        TripEvent::JoinChat(qualified(80)),
        &clock_at(t0),
    );
    let (again, outcome) = step(
        &state,
        TripEvent::JoinChat(qualified(80)),
        &clock_at(t0 + Duration::hours(3)),
    );
    assert_eq!(outcome, Outcome::Rejected(Notice::AlreadyJoined));
    assert_eq!(again.intro_ends_at(), Some(t0 + Duration::hours(24)));
}

#[test]
fn test_commit_requires_introductory_state() {
    let clock = clock_at(start());
    let commit = TripEvent::CommitAndPay {
        price_share: dec!(300),
    };
    let (_, outcome) = step(&TripState::Open, commit, &clock);
    assert_eq!(outcome, Outcome::Rejected(Notice::NotIntroductory));

    let locked = TripState::Locked {
        escrow: crate::escrow::compute_escrow_summary(dec!(300)),
        funds_released: false,
    };
    let (state, outcome) = step(&locked, commit, &clock);
    assert_eq!(outcome, Outcome::Rejected(Notice::NotIntroductory));
    assert_eq!(state, locked);
}

#[test]
fn test_release_without_escrow_is_noop() {
    let clock = clock_at(start());
    let (_, outcome) = step(&TripState::Open, TripEvent::ReleaseCheckInFunds, &clock);
    assert_eq!(outcome, Outcome::Rejected(Notice::NoEscrow));

    let intro = TripState::Introductory {
        intro_ends_at: start(),
    };
    let (_, outcome) = step(&intro, TripEvent::ReleaseCheckInFunds, &clock);
    assert_eq!(outcome, Outcome::Rejected(Notice::NoEscrow));
}

#[test]
fn test_review_before_payment_is_rejected() {
    let clock = clock_at(start());
    let intro = TripState::Introductory {
        intro_ends_at: start(),
    };
    let (state, outcome) = step(&intro, review(5, 5), &clock);
    assert_eq!(outcome, Outcome::Rejected(Notice::TripNotLocked));
    assert_eq!(state, intro);
}

#[test]
fn test_release_after_review_still_allowed_once() {
    let clock = clock_at(start());
    let locked = TripState::Locked {
        escrow: crate::escrow::compute_escrow_summary(dec!(200)),
        funds_released: false,
    };
    let (completed, _) = step(&locked, review(4, 4), &clock);
    let (state, outcome) = step(&completed, TripEvent::ReleaseCheckInFunds, &clock);
    assert_eq!(
        outcome,
        Outcome::Applied(Effect::FundsReleased {
            amount: dec!(105.00)
        })
    );
    assert_eq!(state.status(), TripLifecycleStatus::Completed);

    let (_, outcome) = step(&state, TripEvent::ReleaseCheckInFunds, &clock);
    assert_eq!(outcome, Outcome::Rejected(Notice::FundsAlreadyReleased));
}

#[test]
fn test_applicant_assessment_uses_dna_score() {
    let trip = TravelDna {
        social_energy: 8.0,
        budget_range: 5.0,
        pace: TravelPace::Active,
    };
    let close = TravelDna {
        social_energy: 7.0,
        budget_range: 5.0,
        pace: TravelPace::Active,
    };

    let applicant = Applicant::assess(Some(&close), true, &trip);
    assert!(applicant.signed_in && applicant.onboarded && applicant.verified);
    assert_eq!(applicant.match_score, 96);

    let fresh = Applicant::assess(None, true, &trip);
    assert!(!fresh.onboarded);
    assert_eq!(fresh.match_score, 0);
}

#[test]
fn test_oversized_intro_period_saturates_deadline() {
    let clock = LifecycleClock::new(start(), Duration::days(365 * 1_000_000));
    let (state, outcome) = step(&TripState::Open, TripEvent::JoinChat(qualified(90)), &clock);

    assert_eq!(state.intro_ends_at(), Some(DateTime::<Utc>::MAX_UTC));
    assert!(matches!(outcome, Outcome::Applied(Effect::ChatJoined { .. })));

    let commit = TripEvent::CommitAndPay {
        price_share: dec!(420),
    };
    let (_, outcome) = step(&state, commit, &clock_at(start() + Duration::days(3650)));
    assert_eq!(outcome, Outcome::Rejected(Notice::IntroPeriodActive));
}

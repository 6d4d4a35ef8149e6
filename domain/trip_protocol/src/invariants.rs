#![allow(dead_code)]

use rust_decimal::Decimal;

use crate::escrow::{to_currency, PLATFORM_FEE_RATE};
use crate::types::{EscrowSummary, TripLifecycleStatus, TripState};

/// INV-1: Escrow fields are derived from the base amount.
/// Holds for cent-precise bases; sub-cent inputs are rounded before storage.
pub fn assert_escrow_consistent(summary: &EscrowSummary) {
    assert!(
        summary.base_amount >= Decimal::ZERO,
        "INV-1 violated: negative base amount {}",
        summary.base_amount
    );
    assert_eq!(
        summary.platform_fee,
        to_currency(summary.base_amount * PLATFORM_FEE_RATE),
        "INV-1 violated: platform fee does not match base {}",
        summary.base_amount
    );
    assert_eq!(
        summary.total_amount,
        to_currency(summary.base_amount + summary.platform_fee),
        "INV-1 violated: total is not base + fee"
    );
}

/// INV-2: Released funds never exceed the escrowed total.
pub fn assert_release_within_total(summary: &EscrowSummary) {
    assert!(
        summary.released_to_organizer >= Decimal::ZERO
            && summary.released_to_organizer <= summary.total_amount,
        "INV-2 violated: released {} outside [0, {}]",
        summary.released_to_organizer,
        summary.total_amount
    );
}

/// INV-3: Released funds never decrease.
pub fn assert_release_monotonic(before: &EscrowSummary, after: &EscrowSummary) {
    assert!(
        after.released_to_organizer >= before.released_to_organizer,
        "INV-3 violated: released amount decreased from {} to {}",
        before.released_to_organizer,
        after.released_to_organizer
    );
}

/// INV-4: Status only moves forward one step at a time, or stays put.
///   Open -> Introductory -> Locked -> Completed
pub fn assert_valid_status_transition(from: TripLifecycleStatus, to: TripLifecycleStatus) {
    use TripLifecycleStatus::*;

    let valid = from == to
        || matches!(
            (from, to),
            (Open, Introductory) | (Introductory, Locked) | (Locked, Completed)
        );

    assert!(
        valid,
        "INV-4 violated: invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// INV-5: Once escrowed, the summary survives every later state.
pub fn assert_escrow_retained(before: &TripState, after: &TripState) {
    if let Some(escrow) = before.escrow() {
        let kept = after
            .escrow()
            .expect("INV-5 violated: escrow summary dropped");
        assert_eq!(
            escrow.base_amount, kept.base_amount,
            "INV-5 violated: escrow base changed"
        );
        assert_eq!(
            escrow.total_amount, kept.total_amount,
            "INV-5 violated: escrow total changed"
        );
    }
}

/// Run every stateless invariant over a trip state.
pub fn assert_all_state_invariants(state: &TripState) {
    if let Some(escrow) = state.escrow() {
        assert_escrow_consistent(escrow);
        assert_release_within_total(escrow);
        if !state.funds_released() {
            assert_eq!(
                escrow.released_to_organizer,
                Decimal::ZERO,
                "INV-2 violated: funds marked unreleased but {} paid out",
                escrow.released_to_organizer
            );
        }
    }
}

/// Check a single step against every pairwise invariant.
pub fn assert_step(before: &TripState, after: &TripState) {
    assert_valid_status_transition(before.status(), after.status());
    assert_escrow_retained(before, after);
    if let (Some(b), Some(a)) = (before.escrow(), after.escrow()) {
        assert_release_monotonic(b, a);
    }
    assert_all_state_invariants(after);
}

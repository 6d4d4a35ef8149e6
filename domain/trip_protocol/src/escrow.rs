//! # Escrow
//!
//! Fee-inclusive payment totals and the check-in partial release.
//!
//! All amounts are [`Decimal`] rounded to cents with half-up rounding
//! (`MidpointAwayFromZero`; amounts are never negative so the two agree).
//!
//! | Field                   | Value                          |
//! |-------------------------|--------------------------------|
//! | `base_amount`           | `round(max(base, 0))`          |
//! | `platform_fee`          | `round(base * 5%)`             |
//! | `total_amount`          | `round(base + fee)`            |
//! | `released_to_organizer` | `0`, then `round(total * 50%)` |

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::types::EscrowSummary;

/// Platform surcharge on the base amount (5%).
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Share of the total released to the organizer at check-in (50%).
pub const CHECK_IN_RELEASE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Round to two decimal places, half-up.
pub fn to_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Build the escrow summary for a committed payment.
///
/// Negative base amounts are floored to zero.
pub fn compute_escrow_summary(base_amount: Decimal) -> EscrowSummary {
    let base = base_amount.max(Decimal::ZERO);
    let platform_fee = to_currency(base * PLATFORM_FEE_RATE);
    let total_amount = to_currency(base + platform_fee);

    EscrowSummary {
        base_amount: to_currency(base),
        platform_fee,
        total_amount,
        released_to_organizer: Decimal::ZERO,
    }
}

/// Release half of the escrowed total to the organizer.
///
/// Stateless: calling it again yields the same amount. Whether a release
/// already happened is tracked by the caller.
pub fn release_check_in_funds(summary: &EscrowSummary) -> EscrowSummary {
    EscrowSummary {
        released_to_organizer: to_currency(summary.total_amount * CHECK_IN_RELEASE_RATE),
        ..*summary
    }
}

/// Wallet totals across several escrow summaries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowLedger {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_released: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub in_escrow: Decimal,
}

impl EscrowLedger {
    pub fn from_summaries<'a, I>(summaries: I) -> Self
    where
        I: IntoIterator<Item = &'a EscrowSummary>,
    {
        let (paid, released) = summaries
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(paid, released), s| {
                (paid + s.total_amount, released + s.released_to_organizer)
            });

        Self {
            total_paid: to_currency(paid),
            total_released: to_currency(released),
            in_escrow: to_currency(paid - released),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fee_and_total_for_round_amount() {
        let summary = compute_escrow_summary(dec!(100));
        assert_eq!(summary.base_amount, dec!(100.00));
        assert_eq!(summary.platform_fee, dec!(5.00));
        assert_eq!(summary.total_amount, dec!(105.00));
        assert_eq!(summary.released_to_organizer, Decimal::ZERO);
    }

    #[test]
    fn zero_base_is_all_zero() {
        let summary = compute_escrow_summary(Decimal::ZERO);
        assert_eq!(summary.total_amount, dec!(0.00));
        assert_eq!(summary.platform_fee, dec!(0.00));
    }

    #[test]
    fn negative_base_floors_to_zero() {
        let summary = compute_escrow_summary(dec!(-40));
        assert_eq!(summary, compute_escrow_summary(Decimal::ZERO));
    }

    #[test]
    fn fee_rounds_half_up() {
        // 0.10 * 5% = 0.005
        let summary = compute_escrow_summary(dec!(0.10));
        assert_eq!(summary.platform_fee, dec!(0.01));
        assert_eq!(summary.total_amount, dec!(0.11));

        // 12.345 -> base 12.35, fee 0.61725 -> 0.62, total 12.96725 -> 12.97
        let summary = compute_escrow_summary(dec!(12.345));
        assert_eq!(summary.base_amount, dec!(12.35));
        assert_eq!(summary.platform_fee, dec!(0.62));
        assert_eq!(summary.total_amount, dec!(12.97));
    }

    #[test]
    fn release_pays_half_of_total() {
        let released = release_check_in_funds(&compute_escrow_summary(dec!(200)));
        assert_eq!(released.total_amount, dec!(210.00));
        assert_eq!(released.released_to_organizer, dec!(105.00));
        assert_eq!(released.base_amount, dec!(200));
        assert_eq!(released.platform_fee, dec!(10.00));
    }

    #[test]
    fn release_is_idempotent_at_the_math_level() {
        let once = release_check_in_funds(&compute_escrow_summary(dec!(420)));
        let twice = release_check_in_funds(&once);
        assert_eq!(once, twice);
        assert!(twice.released_to_organizer <= twice.total_amount);
    }

    #[test]
    fn ledger_totals() {
        let paid = compute_escrow_summary(dec!(100));
        let released = release_check_in_funds(&compute_escrow_summary(dec!(200)));
        let ledger = EscrowLedger::from_summaries([&paid, &released]);
        assert_eq!(ledger.total_paid, dec!(315.00));
        assert_eq!(ledger.total_released, dec!(105.00));
        assert_eq!(ledger.in_escrow, dec!(210.00));
    }

    #[test]
    fn empty_ledger_is_zero() {
        let ledger = EscrowLedger::from_summaries(std::iter::empty());
        assert_eq!(ledger, EscrowLedger::default());
    }

    #[test]
    fn summary_serializes_as_numbers() {
        let json = serde_json::to_value(compute_escrow_summary(dec!(100))).unwrap();
        assert_eq!(json["totalAmount"], serde_json::json!(105.0));
        assert_eq!(json["releasedToOrganizer"], serde_json::json!(0.0));
    }
}

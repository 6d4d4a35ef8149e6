//! Compatibility scoring between a traveller's DNA and a trip's DNA.

use crate::types::{TravelDna, TravelPace};

pub const SLIDER_MIN: f64 = 1.0;
pub const SLIDER_MAX: f64 = 10.0;

/// Pace score awarded when the two paces differ.
pub const PACE_MISMATCH_SCORE: f64 = 45.0;

const SOCIAL_WEIGHT: f64 = 0.4;
const BUDGET_WEIGHT: f64 = 0.4;
const PACE_WEIGHT: f64 = 0.2;

/// Clamp a slider value into `[1, 10]`. Non-finite input maps to the lower bound.
pub fn clamp_to_slider_range(value: f64) -> f64 {
    if !value.is_finite() {
        return SLIDER_MIN;
    }
    value.clamp(SLIDER_MIN, SLIDER_MAX)
}

/// Linear similarity in `[0, 100]`: 100 at equal values, 0 at the full 9-point spread.
pub fn slider_similarity(left: f64, right: f64) -> f64 {
    let distance = (clamp_to_slider_range(left) - clamp_to_slider_range(right)).abs();
    (1.0 - distance / (SLIDER_MAX - SLIDER_MIN)) * 100.0
}

fn pace_score(user: TravelPace, trip: TravelPace) -> f64 {
    if user == trip {
        100.0
    } else {
        PACE_MISMATCH_SCORE
    }
}

/// Weighted 0–100 match score.
///
/// Rounds half away from zero; every weighted sum is non-negative, so this is
/// plain half-up rounding.
pub fn match_score(user: &TravelDna, trip: &TravelDna) -> u8 {
    let social = slider_similarity(user.social_energy, trip.social_energy);
    let budget = slider_similarity(user.budget_range, trip.budget_range);
    let pace = pace_score(user.pace, trip.pace);

    let weighted = social * SOCIAL_WEIGHT + budget * BUDGET_WEIGHT + pace * PACE_WEIGHT;
    weighted.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna(social_energy: f64, budget_range: f64, pace: TravelPace) -> TravelDna {
        TravelDna {
            social_energy,
            budget_range,
            pace,
        }
    }

    #[test]
    fn similarity_is_full_only_on_equal_values() {
        for a in 1..=10 {
            for b in 1..=10 {
                let sim = slider_similarity(a as f64, b as f64);
                assert_eq!(sim == 100.0, a == b, "a={a} b={b}");
                assert_eq!(sim, slider_similarity(b as f64, a as f64));
            }
        }
    }

    #[test]
    fn similarity_is_zero_at_the_extremes() {
        assert_eq!(slider_similarity(1.0, 10.0), 0.0);
    }

    #[test]
    fn clamp_handles_out_of_range_and_non_finite() {
        assert_eq!(clamp_to_slider_range(15.0), 10.0);
        assert_eq!(clamp_to_slider_range(-3.0), 1.0);
        assert_eq!(clamp_to_slider_range(f64::NAN), 1.0);
        assert_eq!(clamp_to_slider_range(f64::INFINITY), 1.0);
        assert_eq!(clamp_to_slider_range(7.5), 7.5);
    }

    #[test]
    fn identical_profiles_score_100() {
        for pace in [TravelPace::Active, TravelPace::Chill] {
            let profile = dna(3.0, 8.0, pace);
            assert_eq!(match_score(&profile, &profile), 100);
        }
    }

    #[test]
    fn pace_mismatch_costs_eleven_points() {
        let user = dna(5.0, 5.0, TravelPace::Active);
        let trip = dna(5.0, 5.0, TravelPace::Chill);
        assert_eq!(match_score(&user, &trip), 89);
    }

    #[test]
    fn worst_case_is_the_pace_floor() {
        let user = dna(1.0, 1.0, TravelPace::Active);
        let trip = dna(10.0, 10.0, TravelPace::Chill);
        assert_eq!(match_score(&user, &trip), 9);
    }

    #[test]
    fn out_of_range_input_behaves_like_the_bound() {
        let trip = dna(6.0, 7.0, TravelPace::Active);
        let wild = dna(15.0, -2.0, TravelPace::Active);
        let bounded = dna(10.0, 1.0, TravelPace::Active);
        assert_eq!(match_score(&wild, &trip), match_score(&bounded, &trip));
    }

    #[test]
    fn score_stays_in_bounds() {
        let paces = [TravelPace::Active, TravelPace::Chill];
        for s in -2..=12 {
            for b in -2..=12 {
                for up in paces {
                    for tp in paces {
                        let score = match_score(
                            &dna(s as f64, b as f64, up),
                            &dna(5.0, 5.0, tp),
                        );
                        assert!(score <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn catalog_match_examples() {
        // Default onboarding answers against the Lisbon and Bali trips.
        let user = TravelDna::default();
        assert_eq!(match_score(&user, &dna(8.0, 5.0, TravelPace::Active)), 87);
        assert_eq!(match_score(&user, &dna(5.0, 6.0, TravelPace::Chill)), 85);
    }
}

//! Star ratings and running averages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::escrow::to_currency;
use crate::types::{PublicProfile, RatingSummary};

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

/// A validated 1–5 star rating.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: i64) -> Result<Self> {
        if (MIN_STARS as i64..=MAX_STARS as i64).contains(&stars) {
            Ok(Self(stars as u8))
        } else {
            Err(ProtocolError::InvalidRating {
                min: MIN_STARS,
                max: MAX_STARS,
                got: stars,
            })
        }
    }

    pub fn stars(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ProtocolError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl RatingSummary {
    pub fn new(average: Decimal, count: u32) -> Self {
        Self { average, count }
    }

    /// Fold one more rating into the average, rounded to cents.
    pub fn record(&self, rating: Rating) -> Self {
        let count = self.count + 1;
        let sum = self.average * Decimal::from(self.count) + Decimal::from(rating.stars());
        Self {
            average: to_currency(sum / Decimal::from(count)),
            count,
        }
    }
}

impl PublicProfile {
    /// Record a finished tour with the rating it earned.
    pub fn record_tour(&self, rating: Rating) -> Self {
        Self {
            tours_completed: self.tours_completed + 1,
            rating: self.rating.record(rating),
            ..self.clone()
        }
    }
}

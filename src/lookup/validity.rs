//! Validity windows for time-restricted codes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive `[valid_from, valid_to]` window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPeriods {
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

impl ValidityPeriods {
    pub fn new(valid_from: NaiveDate, valid_to: NaiveDate) -> Self {
        Self {
            valid_from,
            valid_to,
        }
    }

    /// Open-ended window starting at `valid_from`
    pub fn from(valid_from: NaiveDate) -> Self {
        Self::new(valid_from, NaiveDate::MAX)
    }

    pub fn is_current(&self, as_of: NaiveDate) -> bool {
        self.valid_from <= as_of && as_of <= self.valid_to
    }

    /// Strictly after `valid_to`. A date before `valid_from` is not expired.
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        as_of > self.valid_to
    }
}

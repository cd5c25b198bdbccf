use std::fmt;

use serde::{Deserialize, Serialize};

/// A full-precision quantity (money or fuel) produced by the estimator.
///
/// Arithmetic keeps every digit; only [`Amount::rounded`] and `Display`
/// reduce to two decimals, which is what users see.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let cost = Amount::new(1944.4444);
/// assert_eq!(cost.rounded(), 1944.44);
/// assert_eq!(cost.to_string(), "1944.44");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Returns the unrounded value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the value rounded half away from zero to 2 decimals.
    #[must_use]
    pub fn rounded(self) -> f64 {
        round_cents(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Fuel cost calculations.
//!
//! Three modes share this module:
//!
//! - `Trip`: one journey, `fuel = distance / efficiency`, `cost = fuel * price`.
//! - `Daily`: same formula over a round-trip commute distance. The rounded
//!   daily cost is handed to `Monthly` as its starting `daily_cost`.
//! - `Monthly`: `cost = daily_cost * commute_days`.
//!
//! Inputs are validated into [`TripInput`] / [`MonthlyInput`] before any
//! arithmetic runs; [`estimate`] itself cannot fail and has no side effects.

use serde::{Deserialize, Serialize};

use crate::{Amount, EngineError, ValidationErrors, money::round_cents};

pub const MIN_COMMUTE_DAYS: i64 = 1;
pub const MAX_COMMUTE_DAYS: i64 = 31;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Trip,
    Daily,
    Monthly,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trip => "trip",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }

    /// Modes with a region field, and therefore a price lookup.
    pub fn has_region(self) -> bool {
        matches!(self, Self::Trip | Self::Daily)
    }
}

impl TryFrom<&str> for Mode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "trip" => Ok(Self::Trip),
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => {
                let mut errors = ValidationErrors::default();
                errors.push("mode", format!("unknown mode: {other}"));
                Err(EngineError::Validation(errors))
            }
        }
    }
}

/// Validated input for `Trip` and `Daily` mode.
#[derive(Clone, Debug, PartialEq)]
pub struct TripInput {
    distance: f64,
    efficiency: f64,
    state: String,
    fuel_price: f64,
}

impl TripInput {
    /// Checks every field and reports all failures at once.
    pub fn new(
        distance: Option<f64>,
        efficiency: Option<f64>,
        state: Option<&str>,
        fuel_price: Option<f64>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let distance = require_positive(&mut errors, "distance", "Distance", distance);
        let efficiency = require_positive(&mut errors, "efficiency", "Efficiency", efficiency);
        let fuel_price = require_positive(&mut errors, "fuel_price", "Fuel price", fuel_price);
        let state = match state.map(str::trim).filter(|s| !s.is_empty()) {
            Some(state) => Some(state.to_string()),
            None => {
                errors.push("state", "Please select a state");
                None
            }
        };

        match (distance, efficiency, state, fuel_price) {
            (Some(distance), Some(efficiency), Some(state), Some(fuel_price))
                if errors.is_empty() =>
            {
                let input = Self {
                    distance,
                    efficiency,
                    state,
                    fuel_price,
                };
                // Finite fields can still overflow once divided and multiplied.
                if !input.fuel().is_finite() {
                    errors.push("distance", "Distance is too large for this efficiency");
                } else if !input.cost().is_finite() {
                    errors.push("fuel_price", "Fuel price is too large for this trip");
                }
                errors.into_result().map(|()| input)
            }
            // Every `None` above already pushed an error.
            _ => Err(errors),
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn fuel_price(&self) -> f64 {
        self.fuel_price
    }

    pub fn fuel(&self) -> f64 {
        self.distance / self.efficiency
    }

    pub fn cost(&self) -> f64 {
        self.fuel() * self.fuel_price
    }
}

/// Validated input for `Monthly` mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonthlyInput {
    daily_cost: f64,
    commute_days: u8,
}

impl MonthlyInput {
    pub fn new(daily_cost: Option<f64>, commute_days: Option<i64>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let daily_cost = require_positive(&mut errors, "daily_cost", "Daily cost", daily_cost);
        let commute_days = match commute_days {
            None => {
                errors.push("commute_days", "Commute days is required");
                None
            }
            Some(days) if !(MIN_COMMUTE_DAYS..=MAX_COMMUTE_DAYS).contains(&days) => {
                errors.push(
                    "commute_days",
                    format!("Commute days must be between {MIN_COMMUTE_DAYS} and {MAX_COMMUTE_DAYS}"),
                );
                None
            }
            Some(days) => u8::try_from(days).ok(),
        };

        match (daily_cost, commute_days) {
            (Some(daily_cost), Some(commute_days)) if errors.is_empty() => {
                let input = Self {
                    daily_cost,
                    commute_days,
                };
                if !input.cost().is_finite() {
                    errors.push("daily_cost", "Daily cost is too large");
                }
                errors.into_result().map(|()| input)
            }
            _ => Err(errors),
        }
    }

    pub fn daily_cost(&self) -> f64 {
        self.daily_cost
    }

    pub fn commute_days(&self) -> u8 {
        self.commute_days
    }

    pub fn cost(&self) -> f64 {
        self.daily_cost * f64::from(self.commute_days)
    }
}

fn require_positive(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: Option<f64>,
) -> Option<f64> {
    match value {
        None => {
            errors.push(field, format!("{label} is required"));
            None
        }
        Some(v) if !v.is_finite() || v <= 0.0 => {
            errors.push(field, format!("{label} must be greater than 0"));
            None
        }
        Some(v) => Some(v),
    }
}

/// Validated input for one of the three modes.
#[derive(Clone, Debug, PartialEq)]
pub enum EstimateInput {
    Trip(TripInput),
    Daily(TripInput),
    Monthly(MonthlyInput),
}

impl EstimateInput {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Trip(_) => Mode::Trip,
            Self::Daily(_) => Mode::Daily,
            Self::Monthly(_) => Mode::Monthly,
        }
    }
}

/// Full-precision result of [`estimate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Estimate {
    Trip { fuel: Amount, cost: Amount },
    Daily { fuel: Amount, cost: Amount },
    Monthly { daily_cost: Amount, commute_days: u8, cost: Amount },
}

impl Estimate {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Trip { .. } => Mode::Trip,
            Self::Daily { .. } => Mode::Daily,
            Self::Monthly { .. } => Mode::Monthly,
        }
    }

    pub fn cost(&self) -> Amount {
        match self {
            Self::Trip { cost, .. } | Self::Daily { cost, .. } | Self::Monthly { cost, .. } => *cost,
        }
    }

    /// The value `Daily` hands to `Monthly` as its `daily_cost`.
    pub fn monthly_seed(&self) -> Option<f64> {
        match self {
            Self::Daily { cost, .. } => Some(round_cents(cost.value())),
            _ => None,
        }
    }

    pub fn summary(&self) -> Summary {
        match self {
            Self::Trip { fuel, cost } => Summary {
                title: "Trip Estimate".to_string(),
                items: vec![
                    SummaryItem::new("Total Fuel Needed (L)", *fuel),
                    SummaryItem::new("Total Trip Cost", *cost),
                ],
            },
            Self::Daily { fuel, cost } => Summary {
                title: "Daily Commute Estimate".to_string(),
                items: vec![
                    SummaryItem::new("Daily Fuel Needed (L)", *fuel),
                    SummaryItem::new("Daily Commute Cost", *cost),
                ],
            },
            Self::Monthly {
                daily_cost,
                commute_days,
                cost,
            } => Summary {
                title: "Monthly Budget Estimate".to_string(),
                items: vec![
                    SummaryItem::new("Daily Cost", *daily_cost),
                    SummaryItem::new("Commute Days", Amount::new(f64::from(*commute_days))),
                    SummaryItem::new("Monthly Fuel Budget", *cost),
                ],
            },
        }
    }
}

/// Display shape shared by all modes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub title: String,
    pub items: Vec<SummaryItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryItem {
    pub label: String,
    pub value: Amount,
}

impl SummaryItem {
    fn new(label: &str, value: Amount) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// Runs the calculation for a validated input.
pub fn estimate(input: &EstimateInput) -> Estimate {
    match input {
        EstimateInput::Trip(trip) => Estimate::Trip {
            fuel: Amount::new(trip.fuel()),
            cost: Amount::new(trip.cost()),
        },
        EstimateInput::Daily(trip) => Estimate::Daily {
            fuel: Amount::new(trip.fuel()),
            cost: Amount::new(trip.cost()),
        },
        EstimateInput::Monthly(monthly) => Estimate::Monthly {
            daily_cost: Amount::new(monthly.daily_cost),
            commute_days: monthly.commute_days,
            cost: Amount::new(monthly.cost()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(distance: f64, efficiency: f64, price: f64) -> TripInput {
        TripInput::new(Some(distance), Some(efficiency), Some("Kerala"), Some(price)).unwrap()
    }

    #[test]
    fn trip_mode_long_drive() {
        let result = estimate(&EstimateInput::Trip(trip(350.0, 18.0, 100.0)));
        let Estimate::Trip { fuel, cost } = result else {
            panic!("expected trip estimate");
        };
        assert_eq!(fuel.to_string(), "19.44");
        assert_eq!(cost.to_string(), "1944.44");
        // Full precision is kept internally.
        assert!((cost.value() - 350.0 / 18.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn daily_mode_seeds_monthly_with_rounded_cost() {
        let result = estimate(&EstimateInput::Daily(trip(50.0, 18.0, 100.0)));
        assert_eq!(result.mode(), Mode::Daily);
        assert_eq!(result.cost().to_string(), "277.78");
        assert_eq!(result.monthly_seed(), Some(277.78));
    }

    #[test]
    fn only_daily_produces_a_seed() {
        let trip_result = estimate(&EstimateInput::Trip(trip(50.0, 18.0, 100.0)));
        assert_eq!(trip_result.monthly_seed(), None);
    }

    #[test]
    fn monthly_mode_multiplies_days() {
        let input = MonthlyInput::new(Some(150.0), Some(22)).unwrap();
        let result = estimate(&EstimateInput::Monthly(input));
        assert_eq!(result.cost().to_string(), "3300.00");
        assert_eq!(result.summary().items.len(), 3);
    }

    #[test]
    fn commute_days_out_of_range_is_rejected() {
        let err = MonthlyInput::new(Some(150.0), Some(32)).unwrap_err();
        assert_eq!(
            err.get("commute_days"),
            Some("Commute days must be between 1 and 31")
        );
        assert!(MonthlyInput::new(Some(150.0), Some(0)).is_err());
        assert!(MonthlyInput::new(Some(150.0), Some(31)).is_ok());
    }

    #[test]
    fn unset_and_non_positive_fields_are_all_reported() {
        let err = TripInput::new(None, Some(0.0), Some("  "), Some(f64::NAN)).unwrap_err();
        assert_eq!(err.get("distance"), Some("Distance is required"));
        assert_eq!(err.get("efficiency"), Some("Efficiency must be greater than 0"));
        assert_eq!(err.get("state"), Some("Please select a state"));
        assert_eq!(err.get("fuel_price"), Some("Fuel price must be greater than 0"));
        assert_eq!(err.fields().len(), 4);
    }

    #[test]
    fn overflowing_results_are_rejected() {
        let err = TripInput::new(Some(1e308), Some(1e-300), Some("Goa"), Some(100.0)).unwrap_err();
        assert_eq!(
            err.get("distance"),
            Some("Distance is too large for this efficiency")
        );

        let err = TripInput::new(Some(1e300), Some(1.0), Some("Goa"), Some(1e300)).unwrap_err();
        assert_eq!(err.get("fuel_price"), Some("Fuel price is too large for this trip"));

        let err = MonthlyInput::new(Some(f64::MAX), Some(31)).unwrap_err();
        assert_eq!(err.get("daily_cost"), Some("Daily cost is too large"));
    }

    #[test]
    fn summary_titles_follow_mode() {
        let result = estimate(&EstimateInput::Trip(trip(10.0, 10.0, 10.0)));
        let summary = result.summary();
        assert_eq!(summary.title, "Trip Estimate");
        assert_eq!(summary.items[1].value.to_string(), "10.00");
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!(Mode::try_from("daily").unwrap(), Mode::Daily);
        assert!(Mode::try_from("weekly").is_err());
        assert!(!Mode::Monthly.has_region());
    }
}

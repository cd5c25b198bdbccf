//! Per-session form state for the three estimate modes.
//!
//! `FormOrchestrator` keeps one draft per mode, re-derives the fuel price on
//! region changes, and runs the submit lifecycle:
//!
//! 1. [`FormOrchestrator::begin_submit`] validates the active draft, computes
//!    and displays the estimate, and marks the form busy.
//! 2. [`Submission::save`] writes the trip (Trip and Daily mode only).
//! 3. [`FormOrchestrator::finish_submit`] clears the busy flag.
//!
//! [`FormOrchestrator::submit`] runs all three for callers that own the form
//! for the whole attempt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Engine, Estimate, EstimateInput, Mode, MonthlyInput, NewTrip, PriceTable, Trip, TripInput,
    ValidationErrors, estimate,
};

/// Message shown when a trip cannot be saved for lack of an owner.
pub const SIGN_IN_REQUIRED: &str = "You must be signed in to save a trip.";

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("a submission is already in progress")]
    Busy,
    #[error("invalid input: {0}")]
    Validation(ValidationErrors),
}

/// Raw Trip/Daily fields. `None` means the field was never filled in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TripDraft {
    pub distance: Option<f64>,
    pub efficiency: Option<f64>,
    pub state: Option<String>,
    pub fuel_price: Option<f64>,
}

impl TripDraft {
    fn validate(&self) -> Result<TripInput, ValidationErrors> {
        TripInput::new(
            self.distance,
            self.efficiency,
            self.state.as_deref(),
            self.fuel_price,
        )
    }
}

/// Raw Monthly fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDraft {
    pub daily_cost: Option<f64>,
    pub commute_days: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct FormOrchestrator {
    prices: PriceTable,
    mode: Mode,
    trip: TripDraft,
    daily: TripDraft,
    monthly: MonthlyDraft,
    result: Option<Estimate>,
    errors: ValidationErrors,
    in_flight: bool,
}

impl Default for FormOrchestrator {
    fn default() -> Self {
        Self::new(PriceTable::default())
    }
}

impl FormOrchestrator {
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices,
            mode: Mode::default(),
            trip: TripDraft::default(),
            daily: TripDraft::default(),
            monthly: MonthlyDraft::default(),
            result: None,
            errors: ValidationErrors::default(),
            in_flight: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch the active mode. The displayed result and errors are cleared
    /// even when the mode does not change.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.result = None;
        self.errors = ValidationErrors::default();
    }

    pub fn result(&self) -> Option<&Estimate> {
        self.result.as_ref()
    }

    /// Field errors from the last rejected submission.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn trip_draft(&self, mode: Mode) -> Option<&TripDraft> {
        match mode {
            Mode::Trip => Some(&self.trip),
            Mode::Daily => Some(&self.daily),
            Mode::Monthly => None,
        }
    }

    fn trip_draft_mut(&mut self, mode: Mode) -> Option<&mut TripDraft> {
        match mode {
            Mode::Trip => Some(&mut self.trip),
            Mode::Daily => Some(&mut self.daily),
            Mode::Monthly => None,
        }
    }

    pub fn monthly_draft(&self) -> &MonthlyDraft {
        &self.monthly
    }

    /// Select a region and overwrite the fuel price from the price table.
    ///
    /// The price is replaced even if it was typed by hand. An empty region
    /// unsets the selection and leaves the price alone. Returns the new price,
    /// or `None` when nothing was looked up (empty region, Monthly mode).
    pub fn set_region(&mut self, mode: Mode, region: &str) -> Option<f64> {
        let prices = self.prices;
        let draft = self.trip_draft_mut(mode)?;
        let region = region.trim();
        if region.is_empty() {
            draft.state = None;
            return None;
        }
        let price = prices.lookup(region);
        draft.state = Some(region.to_string());
        draft.fuel_price = Some(price);
        Some(price)
    }

    /// Returns `false` for Monthly mode, which has no distance.
    pub fn set_distance(&mut self, mode: Mode, distance: Option<f64>) -> bool {
        self.trip_draft_mut(mode)
            .map(|draft| draft.distance = distance)
            .is_some()
    }

    pub fn set_efficiency(&mut self, mode: Mode, efficiency: Option<f64>) -> bool {
        self.trip_draft_mut(mode)
            .map(|draft| draft.efficiency = efficiency)
            .is_some()
    }

    /// Manual price edit; no lookup happens.
    pub fn set_fuel_price(&mut self, mode: Mode, fuel_price: Option<f64>) -> bool {
        self.trip_draft_mut(mode)
            .map(|draft| draft.fuel_price = fuel_price)
            .is_some()
    }

    pub fn set_daily_cost(&mut self, daily_cost: Option<f64>) {
        self.monthly.daily_cost = daily_cost;
    }

    pub fn set_commute_days(&mut self, commute_days: Option<i64>) {
        self.monthly.commute_days = commute_days;
    }

    fn validate_active(&self) -> Result<EstimateInput, ValidationErrors> {
        match self.mode {
            Mode::Trip => self.trip.validate().map(EstimateInput::Trip),
            Mode::Daily => self.daily.validate().map(EstimateInput::Daily),
            Mode::Monthly => MonthlyInput::new(self.monthly.daily_cost, self.monthly.commute_days)
                .map(EstimateInput::Monthly),
        }
    }

    /// Validate and compute the active mode, then mark the form busy.
    ///
    /// Rejected while another submission is in flight. On validation failure
    /// the field errors are kept for display and the form stays idle.
    pub fn begin_submit(&mut self) -> Result<Submission, FormError> {
        if self.in_flight {
            return Err(FormError::Busy);
        }

        let input = match self.validate_active() {
            Ok(input) => input,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(FormError::Validation(errors));
            }
        };
        self.errors = ValidationErrors::default();

        let result = estimate(&input);
        if let Some(seed) = result.monthly_seed() {
            self.monthly.daily_cost = Some(seed);
        }
        self.result = Some(result);
        self.in_flight = true;

        let new_trip = match &input {
            EstimateInput::Trip(trip) | EstimateInput::Daily(trip) => Some(NewTrip::from(trip)),
            EstimateInput::Monthly(_) => None,
        };
        Ok(Submission {
            estimate: result,
            new_trip,
        })
    }

    /// Re-enable submission. Call once per successful `begin_submit`,
    /// whatever the save outcome.
    pub fn finish_submit(&mut self) {
        self.in_flight = false;
    }

    /// Run a whole submission against an optional store.
    pub async fn submit(
        &mut self,
        store: Option<&Engine>,
        user_id: Option<&str>,
    ) -> Result<SubmitReport, FormError> {
        let submission = self.begin_submit()?;
        let report = submission.save(store, user_id).await;
        self.finish_submit();
        Ok(report)
    }
}

/// A computed estimate waiting to be saved.
#[derive(Debug)]
pub struct Submission {
    estimate: Estimate,
    new_trip: Option<NewTrip>,
}

impl Submission {
    pub fn estimate(&self) -> &Estimate {
        &self.estimate
    }

    /// `None` for Monthly mode, which is never persisted.
    pub fn new_trip(&self) -> Option<&NewTrip> {
        self.new_trip.as_ref()
    }

    /// Save the trip if there is one and a store is engaged.
    ///
    /// Failures become a warning on the report; the estimate is always kept.
    pub async fn save(self, store: Option<&Engine>, user_id: Option<&str>) -> SubmitReport {
        let mut report = SubmitReport {
            estimate: self.estimate,
            trip: None,
            warning: None,
        };
        let (Some(store), Some(new_trip)) = (store, self.new_trip) else {
            return report;
        };
        let Some(user_id) = user_id else {
            report.warning = Some(SIGN_IN_REQUIRED.to_string());
            return report;
        };

        match store.write_trip(user_id, new_trip).await {
            Ok(trip) => report.trip = Some(trip),
            Err(err) => {
                tracing::warn!(user_id, "failed to save trip: {err}");
                report.warning = Some(format!("Could not save trip: {err}"));
            }
        }
        report
    }
}

/// Outcome of one submission.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitReport {
    pub estimate: Estimate,
    pub trip: Option<Trip>,
    pub warning: Option<String>,
}

//! Fuel expense estimation and trip history.
//!
//! - [`estimate`] computes Trip, Daily and Monthly estimates from validated
//!   input.
//! - [`PriceTable`] maps regions to fuel prices.
//! - [`FormOrchestrator`] holds the per-mode drafts and runs submissions.
//! - [`Engine`] persists trips, streams them live per owner and clears an
//!   owner's history atomically.

pub use error::{EngineError, FieldError, ValidationErrors};
pub use estimate::{
    Estimate, EstimateInput, MAX_COMMUTE_DAYS, MIN_COMMUTE_DAYS, Mode, MonthlyInput, Summary,
    SummaryItem, TripInput, estimate,
};
pub use form::{
    FormError, FormOrchestrator, MonthlyDraft, SIGN_IN_REQUIRED, Submission, SubmitReport,
    TripDraft,
};
pub use money::Amount;
pub use ops::{ClearOutcome, Engine, EngineBuilder, TripSubscription};
pub use prices::{DEFAULT_PRICE, PriceTable, REGION_PRICES};
pub use trips::{NewTrip, Trip};

mod error;
mod estimate;
mod form;
mod money;
mod ops;
mod prices;
mod trips;

type ResultEngine<T> = Result<T, EngineError>;

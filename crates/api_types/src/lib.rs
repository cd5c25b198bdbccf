use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Trip,
    Daily,
    Monthly,
}

/// Field-scoped validation failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldErrorView {
    pub field: String,
    pub message: String,
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorView>,
}

pub mod price {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceView {
        pub region: String,
        pub price: f64,
        /// `false` when the default price was used.
        pub listed: bool,
    }
}

pub mod estimate {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ResultItem {
        pub label: String,
        /// Full precision.
        pub value: f64,
        /// Rounded to two decimals.
        pub display: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ResultView {
        pub mode: Mode,
        pub title: String,
        pub items: Vec<ResultItem>,
    }
}

pub mod form {
    use super::*;
    use crate::estimate::ResultView;
    use crate::trip::TripView;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct TripDraftView {
        pub distance: Option<f64>,
        pub efficiency: Option<f64>,
        pub state: Option<String>,
        pub fuel_price: Option<f64>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct MonthlyDraftView {
        pub daily_cost: Option<f64>,
        pub commute_days: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FormView {
        pub mode: Mode,
        pub trip: TripDraftView,
        pub daily: TripDraftView,
        pub monthly: MonthlyDraftView,
        pub result: Option<ResultView>,
        pub errors: Vec<FieldErrorView>,
        pub submitting: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ModeUpdate {
        pub mode: Mode,
    }

    /// Fields present in the body are replaced; absent fields are kept.
    ///
    /// Setting `state` re-derives `fuel_price` from the price table, unless
    /// `fuel_price` is sent in the same request.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TripDraftPatch {
        pub distance: Option<f64>,
        pub efficiency: Option<f64>,
        pub state: Option<String>,
        pub fuel_price: Option<f64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MonthlyDraftPatch {
        pub daily_cost: Option<f64>,
        pub commute_days: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubmitResponse {
        pub result: ResultView,
        /// The saved trip, when one was written.
        pub trip: Option<TripView>,
        /// Non-fatal persistence problem. `result` is still valid.
        pub warning: Option<String>,
    }
}

pub mod trip {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TripView {
        pub id: Uuid,
        pub distance: f64,
        pub efficiency: f64,
        pub state: String,
        pub fuel_price: f64,
        pub total_cost: f64,
        pub created_at: DateTime<Utc>,
        /// e.g. `5 Mar 2026`.
        pub date: String,
        /// `total_cost` rounded to two decimals.
        pub cost: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripList {
        pub trips: Vec<TripView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClearResponse {
        pub deleted_count: u64,
    }

    /// History date label: day, short month, year.
    pub fn format_date(created_at: DateTime<Utc>) -> String {
        created_at.format("%-d %b %Y").to_string()
    }

}

use api_types::{ErrorBody, FieldErrorView};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, FormError, ValidationErrors};

pub use server::{ServerConfig, ServerState, app, run_with_listener, spawn_with_listener};

mod form;
mod prices;
mod server;
mod trips;

pub mod types {
    pub mod estimate {
        pub use api_types::estimate::{ResultItem, ResultView};
    }

    pub mod form {
        pub use api_types::form::{
            FormView, ModeUpdate, MonthlyDraftPatch, MonthlyDraftView, SubmitResponse,
            TripDraftPatch, TripDraftView,
        };
    }

    pub mod trip {
        pub use api_types::trip::{ClearResponse, TripList, TripView};
    }

    pub mod price {
        pub use api_types::price::PriceView;
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Form(FormError),
    Unauthorized(String),
    Generic(String),
}

fn field_views(errors: &ValidationErrors) -> Vec<FieldErrorView> {
    errors
        .fields()
        .iter()
        .map(|err| FieldErrorView {
            field: err.field.to_string(),
            message: err.message.clone(),
        })
        .collect()
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Identity(_) => StatusCode::UNAUTHORIZED,
        EngineError::Unavailable(_) | EngineError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorBody {
    match err {
        EngineError::Validation(errors) => ErrorBody {
            error: "invalid input".to_string(),
            fields: field_views(&errors),
        },
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorBody {
                error: "trip storage is unavailable".to_string(),
                fields: Vec::new(),
            }
        }
        EngineError::Unavailable(reason) => {
            tracing::warn!("trip storage unavailable: {reason}");
            ErrorBody {
                error: "trip storage is unavailable".to_string(),
                fields: Vec::new(),
            }
        }
        EngineError::InvalidRecord(msg) => {
            tracing::error!("corrupt trip record: {msg}");
            ErrorBody {
                error: "internal server error".to_string(),
                fields: Vec::new(),
            }
        }
        other => ErrorBody {
            error: other.to_string(),
            fields: Vec::new(),
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Form(FormError::Busy) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: FormError::Busy.to_string(),
                    fields: Vec::new(),
                },
            ),
            ServerError::Form(FormError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "invalid input".to_string(),
                    fields: field_views(&errors),
                },
            ),
            ServerError::Unauthorized(error) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error,
                    fields: Vec::new(),
                },
            ),
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    fields: Vec::new(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<FormError> for ServerError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}

//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when user input fails field checks. No computation
//!   or write happens.
//! - [`Identity`] thrown when a write is attempted without an owner.
//! - [`Database`] thrown when the backend create/delete/query fails.
//! - [`Unavailable`] thrown by an engine built without a database.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Identity`]: EngineError::Identity
//!  [`Database`]: EngineError::Database
//!  [`Unavailable`]: EngineError::Unavailable
use std::fmt;

use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),
    #[error("Missing identity: {0}")]
    Identity(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for backend failures, including a store that was never connected.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Unavailable(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Identity(a), Self::Identity(b)) => a == b,
            (Self::InvalidRecord(a), Self::InvalidRecord(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<ValidationErrors> for EngineError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// A single rejected input field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation for one submission.
///
/// Never empty when returned inside an `Err`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Message recorded for `field`, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
            first = false;
        }
        Ok(())
    }
}

//! Error kinds surfaced by the quote form

use thiserror::Error;

/// Rejected amount input. Resolved locally and never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El monto debe estar entre 3 y 999")]
    NotANumber(String),
    #[error("El monto debe estar entre 3 y 999")]
    OutOfRange(i64),
}

/// Failure of a single quote request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Failed to fetch data: {0}")]
    Request(String),
    #[error("Failed to fetch data: HTTP {0}")]
    Status(u16),
    #[error("Failed to fetch data: invalid response ({0})")]
    Decode(String),
}

/// The single error slot shown by the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported currency: {0}")]
pub struct UnknownCurrency(pub String);

//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`PermissionDenied`] thrown when the caller's role is below the one the
//!   operation requires. Always raised before anything is written.
//! - [`KeyNotFound`] thrown when an item is not found (or not visible to the
//!   caller).
//! - [`Conflict`] thrown when an entry changed since the caller last read it.
//!
//!  [`PermissionDenied`]: EngineError::PermissionDenied
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidDirection(a), Self::InvalidDirection(b)) => a == b,
            (Self::InvalidTransfer(a), Self::InvalidTransfer(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

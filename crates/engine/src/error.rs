//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when an amount is zero, negative or overflows.
//! - [`InvalidInput`] thrown when a required text field is blank.
//! - [`InsufficientBalance`] thrown when the payer cannot cover an amount. It
//!   carries the balance observed at check time so callers can render it.
//! - [`SelfTransfer`] thrown when sender and receiver are the same account.
//! - [`NotFound`] thrown for unknown items and for tokens that are no longer
//!   pending.
//! - [`Forbidden`] thrown when the actor is not allowed to act on an item.
//! - [`AuthFailed`] thrown for any bad application credential.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`SelfTransfer`]: EngineError::SelfTransfer
//!  [`NotFound`]: EngineError::NotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`AuthFailed`]: EngineError::AuthFailed
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient balance: current score is {current_score}")]
    InsufficientBalance { current_score: i64 },
    #[error("Cannot transfer points to yourself")]
    SelfTransfer,
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid application credentials")]
    AuthFailed,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn not_found(what: &str) -> Self {
        Self::NotFound(what.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (
                Self::InsufficientBalance { current_score: a },
                Self::InsufficientBalance { current_score: b },
            ) => a == b,
            (Self::SelfTransfer, Self::SelfTransfer) => true,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::AuthFailed, Self::AuthFailed) => true,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

//! The errors the ledger can return.

use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("unsupported currency: {0}")]
    UnknownCurrency(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::UnknownCurrency(a), Self::UnknownCurrency(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

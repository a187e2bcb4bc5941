use crate::domain::money::Money;
use chrono::NaiveDate;
use strum_macros::Display;
use thiserror::Error;

/// Business failures surfaced to callers of the ledger engine.
///
/// Every variant maps to a stable [`ErrorKind`] and carries a human-readable
/// message; internal identifiers and store details are never leaked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Account {0} is not active")]
    InactiveAccount(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),
    #[error("Invalid PIN")]
    InvalidPin,
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: Money, requested: Money },
    #[error("Source and destination accounts are the same")]
    SameAccountTransfer,
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidInput,
    Unauthorized,
    InsufficientFunds,
    Conflict,
    Storage,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound(_) => ErrorKind::NotFound,
            LedgerError::InactiveAccount(_) => ErrorKind::InvalidState,
            LedgerError::InvalidAmount(_) | LedgerError::InvalidDateRange { .. } => {
                ErrorKind::InvalidInput
            }
            LedgerError::InvalidPin => ErrorKind::Unauthorized,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::SameAccountTransfer | LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(
            LedgerError::AccountNotFound("ACC1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(LedgerError::InvalidPin.kind(), ErrorKind::Unauthorized);
        assert_eq!(LedgerError::SameAccountTransfer.kind(), ErrorKind::Conflict);
        assert_eq!(
            LedgerError::InvalidAmount(Money::new(dec!(-1))).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn messages_stay_human_readable() {
        let err = LedgerError::InsufficientFunds {
            available: Money::new(dec!(100.00)),
            requested: Money::new(dec!(150.00)),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: available 100.00, requested 150.00"
        );
    }
}

use crate::domain::{LedgerError, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Savings,
    Current,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

/// A customer account with its current balance.
///
/// The balance is only ever changed through [`Account::credit`] and
/// [`Account::debit`]; a committed balance is never negative. `version` is
/// the optimistic-concurrency counter the store checks on every commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub account_number: String,
    pub customer_id: Uuid,
    pub account_type: AccountType,
    pub status: AccountStatus,
    pub balance: Money,
    pub pin_hash: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new account: zero balance, active, version 0.
    pub fn open(
        customer_id: Uuid,
        account_type: AccountType,
        account_number: String,
        pin_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            account_number,
            customer_id,
            account_type,
            status: AccountStatus::Active,
            balance: Money::ZERO,
            pin_hash,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Adds a positive amount to the balance.
    pub fn credit(&mut self, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.balance = self.balance + amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Subtracts a positive amount from the balance. Withdrawing the exact
    /// balance succeeds; anything beyond it is `InsufficientFunds`.
    pub fn debit(&mut self, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }
        self.balance = self.balance - amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_status(&mut self, status: AccountStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

use crate::domain::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
    Interest,
}

impl TransactionKind {
    pub fn is_credit(&self) -> bool {
        matches!(
            self,
            TransactionKind::Deposit | TransactionKind::TransferIn | TransactionKind::Interest
        )
    }

    /// The delta this kind applies to a balance, used when replaying a
    /// ledger: credits are positive, debits negative.
    pub fn signed_amount(&self, amount: Money) -> Decimal {
        if self.is_credit() {
            amount.amount()
        } else {
            -amount.amount()
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    Food,
    Transport,
    Bills,
    Salary,
    Shopping,
    Entertainment,
    Healthcare,
    Education,
    #[default]
    Other,
}

impl TransactionCategory {
    /// Lenient parse for caller-supplied category strings; anything
    /// unrecognized lands in `Other` instead of erroring.
    pub fn parse_or_other(raw: &str) -> Self {
        TransactionCategory::from_str(raw.trim()).unwrap_or_default()
    }
}

/// One immutable row of the ledger.
///
/// A transaction is created exactly once, synchronously with the balance
/// mutation it documents, and is never updated or deleted afterwards. It
/// points at its owning account by id only; the account holds no live
/// collection of rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_id: String,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub category: TransactionCategory,
    /// Positive magnitude; direction is conveyed by `kind`.
    pub amount: Money,
    pub description: String,
    /// The other account of a transfer, when there is one.
    pub counterparty_account_number: Option<String>,
    /// The owning account's balance at the instant this row was committed.
    pub balance_after: Money,
    pub created_at: DateTime<Utc>,
}

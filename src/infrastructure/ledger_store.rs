use crate::domain::{Account, LedgerError, Transaction, TransactionCategory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LedgerStoreError {
    #[error("Account not found: {0}")]
    NotFound(String),
    #[error("Account number '{0}' already exists")]
    DuplicateAccountNumber(String),
    #[error("Write conflict on account {account_number}: version {expected} is stale")]
    VersionConflict {
        account_number: String,
        expected: i64,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}

impl From<LedgerStoreError> for LedgerError {
    fn from(err: LedgerStoreError) -> Self {
        match err {
            LedgerStoreError::NotFound(number) => LedgerError::AccountNotFound(number),
            LedgerStoreError::DuplicateAccountNumber(number) => {
                LedgerError::Conflict(format!("account number '{number}' already exists"))
            }
            LedgerStoreError::VersionConflict { account_number, .. } => {
                LedgerError::Conflict(format!("concurrent update on account {account_number}"))
            }
            LedgerStoreError::Database(e) => LedgerError::Storage(e.to_string()),
            LedgerStoreError::Corrupt(msg) => LedgerError::Storage(msg),
        }
    }
}

/// One atomic unit of work against the ledger: the full mutated state of the
/// touched accounts plus the transaction rows documenting the mutation.
///
/// Each account carries the `version` it was read at; the store persists it
/// as `version + 1` and fails the whole unit with [`VersionConflict`] if the
/// stored version moved in between. Either everything in the unit lands or
/// nothing does — no orphan transaction row can outlive a rolled-back
/// balance write.
///
/// [`VersionConflict`]: LedgerStoreError::VersionConflict
#[derive(Debug, Clone, Default)]
pub struct LedgerUpdate {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

impl LedgerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }
}

/// Durable keyed storage for accounts and their transaction rows.
///
/// Implementations must process the accounts of a [`LedgerUpdate`] in
/// ascending `account_number` order so two opposing transfers between the
/// same pair of accounts cannot deadlock.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_account(&self, account: &Account) -> Result<(), LedgerStoreError>;

    async fn account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerStoreError>;

    /// All accounts currently in `Active` status, for the interest sweep.
    async fn active_accounts(&self) -> Result<Vec<Account>, LedgerStoreError>;

    /// Atomically applies a unit of work. See [`LedgerUpdate`].
    async fn commit(&self, update: LedgerUpdate) -> Result<(), LedgerStoreError>;

    /// Transactions of an account, newest first.
    async fn transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>, LedgerStoreError>;

    /// Transactions within `[from, to)`, oldest first.
    async fn transactions_in_range(
        &self,
        account_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, LedgerStoreError>;

    /// Transactions of one category, newest first.
    async fn transactions_by_category(
        &self,
        account_id: Uuid,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, LedgerStoreError>;
}

use crate::domain::{Account, Transaction, TransactionCategory};
use crate::infrastructure::ledger_store::{LedgerStore, LedgerStoreError, LedgerUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-memory [`LedgerStore`] used by the test suites and as the reference
/// implementation of the commit contract.
///
/// `commit` takes the per-account mutexes in ascending account-number order,
/// re-checks every version while holding them, and only then writes. All
/// validation happens before the first write, so a unit is never partially
/// applied.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    accounts: DashMap<String, Account>,
    transactions: DashMap<Uuid, Vec<Transaction>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, account_number: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_number.to_string())
            .or_default()
            .value()
            .clone()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), LedgerStoreError> {
        match self.accounts.entry(account.account_number.clone()) {
            Entry::Occupied(_) => Err(LedgerStoreError::DuplicateAccountNumber(
                account.account_number.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                Ok(())
            }
        }
    }

    async fn account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerStoreError> {
        Ok(self.accounts.get(number).map(|entry| entry.value().clone()))
    }

    async fn active_accounts(&self) -> Result<Vec<Account>, LedgerStoreError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(accounts)
    }

    async fn commit(&self, update: LedgerUpdate) -> Result<(), LedgerStoreError> {
        // Ascending lock order keeps opposing transfers deadlock-free.
        let mut numbers: Vec<String> = update
            .accounts
            .iter()
            .map(|a| a.account_number.clone())
            .collect();
        numbers.sort();
        numbers.dedup();

        let mut guards = Vec::with_capacity(numbers.len());
        for number in &numbers {
            let lock = self.lock_for(number);
            guards.push(lock.lock_owned().await);
        }

        for account in &update.accounts {
            let stored_version = self
                .accounts
                .get(&account.account_number)
                .map(|entry| entry.value().version)
                .ok_or_else(|| LedgerStoreError::NotFound(account.account_number.clone()))?;
            if stored_version != account.version {
                return Err(LedgerStoreError::VersionConflict {
                    account_number: account.account_number.clone(),
                    expected: account.version,
                });
            }
        }

        for account in &update.accounts {
            let mut stored = account.clone();
            stored.version += 1;
            self.accounts.insert(stored.account_number.clone(), stored);
        }
        for transaction in update.transactions {
            self.transactions
                .entry(transaction.account_id)
                .or_default()
                .push(transaction);
        }
        Ok(())
    }

    async fn transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>, LedgerStoreError> {
        let mut rows = self
            .transactions
            .get(&account_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn transactions_in_range(
        &self,
        account_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, LedgerStoreError> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .get(&account_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|t| t.created_at >= from && t.created_at < to)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn transactions_by_category(
        &self,
        account_id: Uuid,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, LedgerStoreError> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .get(&account_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|t| t.category == category)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

use crate::domain::{Account, LedgerError, Transaction, TransactionCategory};
use crate::infrastructure::ledger_store::LedgerStore;
use chrono::{Days, NaiveDate, NaiveTime};
use std::sync::Arc;

/// Read-only projections over an account's ledger, for statements and
/// history views. Never mutates anything.
pub struct StatementReader {
    store: Arc<dyn LedgerStore>,
}

impl StatementReader {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Full history, newest first.
    pub async fn history(&self, number: &str) -> Result<Vec<Transaction>, LedgerError> {
        let account = self.load(number).await?;
        Ok(self.store.transactions(account.id).await?)
    }

    /// History within a date range, inclusive of both endpoints at day
    /// granularity: `[start 00:00, (end + 1 day) 00:00)` UTC.
    pub async fn history_between(
        &self,
        number: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidDateRange { start, end });
        }
        let account = self.load(number).await?;
        let from = start.and_time(NaiveTime::MIN).and_utc();
        let to = end
            .checked_add_days(Days::new(1))
            .ok_or(LedgerError::InvalidDateRange { start, end })?
            .and_time(NaiveTime::MIN)
            .and_utc();
        Ok(self
            .store
            .transactions_in_range(account.id, from, to)
            .await?)
    }

    /// History filtered by category. Unrecognized category strings fall back
    /// to OTHER instead of erroring.
    pub async fn history_by_category(
        &self,
        number: &str,
        raw_category: &str,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let category = TransactionCategory::parse_or_other(raw_category);
        let account = self.load(number).await?;
        Ok(self
            .store
            .transactions_by_category(account.id, category)
            .await?)
    }

    async fn load(&self, number: &str) -> Result<Account, LedgerError> {
        self.store
            .account_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AccountService;
    use crate::domain::{AccountType, Money};
    use crate::infrastructure::credentials::Argon2PinHasher;
    use crate::infrastructure::memory_store::InMemoryLedgerStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn seeded() -> (StatementReader, AccountService, String) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = AccountService::new(store.clone(), Arc::new(Argon2PinHasher));
        let reader = StatementReader::new(store);
        let account = service
            .open_account(Uuid::new_v4(), AccountType::Savings, None)
            .await
            .unwrap();
        let number = account.account_number.clone();
        service
            .deposit(&number, Money::new(dec!(100.00)), None)
            .await
            .unwrap();
        service
            .withdraw(&number, Money::new(dec!(30.00)), "", None)
            .await
            .unwrap();
        (reader, service, number)
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let (reader, _, number) = seeded().await;
        let rows = reader.history(&number).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].created_at >= rows[1].created_at);
        assert_eq!(rows[0].balance_after, Money::new(dec!(70.00)));
    }

    #[tokio::test]
    async fn todays_rows_fall_inside_an_inclusive_range() {
        let (reader, _, number) = seeded().await;
        let today = Utc::now().date_naive();
        let rows = reader.history_between(&number, today, today).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn reversed_range_is_rejected() {
        let (reader, _, number) = seeded().await;
        let today = Utc::now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        let err = reader
            .history_between(&number, today, yesterday)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDateRange { .. }));
    }

    #[tokio::test]
    async fn unknown_category_reads_the_other_bucket() {
        let (reader, _, number) = seeded().await;
        // Deposits and withdrawals default to OTHER.
        let rows = reader
            .history_by_category(&number, "groceries")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let rows = reader.history_by_category(&number, "FOOD").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (reader, _, _) = seeded().await;
        let err = reader.history("ACC9999999999").await.unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound("ACC9999999999".into()));
    }
}

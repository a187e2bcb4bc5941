use crate::domain::{
    Account, AccountStatus, AccountType, Money, Transaction, TransactionCategory, TransactionKind,
};
use crate::infrastructure::ledger_store::{LedgerStore, LedgerStoreError, LedgerUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    account_number TEXT NOT NULL UNIQUE,
    customer_id UUID NOT NULL,
    account_type TEXT NOT NULL,
    status TEXT NOT NULL,
    balance NUMERIC(19, 2) NOT NULL,
    pin_hash TEXT,
    version BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS transactions (
    id UUID PRIMARY KEY,
    transaction_id TEXT NOT NULL UNIQUE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    kind TEXT NOT NULL,
    category TEXT NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    description TEXT NOT NULL,
    counterparty_account_number TEXT,
    balance_after NUMERIC(19, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_account_created
    ON transactions (account_id, created_at DESC);
"#;

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed [`LedgerStore`].
///
/// Writes are optimistic: `commit` runs inside one database transaction and
/// guards every account update with `AND version = $n`; zero affected rows
/// means a concurrent writer got there first and the whole unit rolls back.
/// Updates are issued in ascending account-number order so row locks are
/// always taken in the same order.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, LedgerStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Idempotently creates the accounts and transactions tables.
    pub async fn init_schema(&self) -> Result<(), LedgerStoreError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, LedgerStoreError> {
    let account_number: String = row.try_get("account_number")?;
    let type_raw: String = row.try_get("account_type")?;
    let status_raw: String = row.try_get("status")?;
    let account_type = type_raw.parse::<AccountType>().map_err(|_| {
        LedgerStoreError::Corrupt(format!(
            "account {account_number}: unknown account type '{type_raw}'"
        ))
    })?;
    let status = status_raw.parse::<AccountStatus>().map_err(|_| {
        LedgerStoreError::Corrupt(format!(
            "account {account_number}: unknown status '{status_raw}'"
        ))
    })?;
    Ok(Account {
        id: row.try_get("id")?,
        account_number,
        customer_id: row.try_get("customer_id")?,
        account_type,
        status,
        balance: Money::new(row.try_get::<Decimal, _>("balance")?),
        pin_hash: row.try_get("pin_hash")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, LedgerStoreError> {
    let transaction_id: String = row.try_get("transaction_id")?;
    let kind_raw: String = row.try_get("kind")?;
    let category_raw: String = row.try_get("category")?;
    let kind = kind_raw.parse::<TransactionKind>().map_err(|_| {
        LedgerStoreError::Corrupt(format!(
            "transaction {transaction_id}: unknown kind '{kind_raw}'"
        ))
    })?;
    // Category strings written by this crate always parse; an unknown one in
    // the table still reads back as OTHER rather than failing the query.
    let category = TransactionCategory::parse_or_other(&category_raw);
    Ok(Transaction {
        id: row.try_get("id")?,
        transaction_id,
        account_id: row.try_get("account_id")?,
        kind,
        category,
        amount: Money::new(row.try_get::<Decimal, _>("amount")?),
        description: row.try_get("description")?,
        counterparty_account_number: row.try_get("counterparty_account_number")?,
        balance_after: Money::new(row.try_get::<Decimal, _>("balance_after")?),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), LedgerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, account_number, customer_id, account_type, status,
                 balance, pin_hash, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id)
        .bind(&account.account_number)
        .bind(account.customer_id)
        .bind(account.account_type.to_string())
        .bind(account.status.to_string())
        .bind(account.balance.amount())
        .bind(&account.pin_hash)
        .bind(account.version)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return LedgerStoreError::DuplicateAccountNumber(
                        account.account_number.clone(),
                    );
                }
            }
            LedgerStoreError::Database(e)
        })?;
        Ok(())
    }

    async fn account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerStoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE account_number = $1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn active_accounts(&self) -> Result<Vec<Account>, LedgerStoreError> {
        let rows = sqlx::query("SELECT * FROM accounts WHERE status = $1 ORDER BY account_number")
            .bind(AccountStatus::Active.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(account_from_row).collect()
    }

    async fn commit(&self, update: LedgerUpdate) -> Result<(), LedgerStoreError> {
        let mut accounts = update.accounts;
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));

        let mut tx = self.pool.begin().await?;
        for account in &accounts {
            let result = sqlx::query(
                r#"
                UPDATE accounts
                SET status = $1, balance = $2, pin_hash = $3,
                    version = version + 1, updated_at = $4
                WHERE id = $5 AND version = $6
                "#,
            )
            .bind(account.status.to_string())
            .bind(account.balance.amount())
            .bind(&account.pin_hash)
            .bind(account.updated_at)
            .bind(account.id)
            .bind(account.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                warn!(
                    account = %account.account_number,
                    version = account.version,
                    "ledger commit lost the version race"
                );
                return Err(LedgerStoreError::VersionConflict {
                    account_number: account.account_number.clone(),
                    expected: account.version,
                });
            }
        }

        for transaction in &update.transactions {
            sqlx::query(
                r#"
                INSERT INTO transactions
                    (id, transaction_id, account_id, kind, category, amount,
                     description, counterparty_account_number, balance_after, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(transaction.id)
            .bind(&transaction.transaction_id)
            .bind(transaction.account_id)
            .bind(transaction.kind.to_string())
            .bind(transaction.category.to_string())
            .bind(transaction.amount.amount())
            .bind(&transaction.description)
            .bind(&transaction.counterparty_account_number)
            .bind(transaction.balance_after.amount())
            .bind(transaction.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>, LedgerStoreError> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = $1 ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn transactions_in_range(
        &self,
        account_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, LedgerStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE account_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(account_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn transactions_by_category(
        &self,
        account_id: Uuid,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, LedgerStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE account_id = $1 AND category = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .bind(category.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }
}

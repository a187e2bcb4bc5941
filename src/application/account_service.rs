use crate::application::recorder::TransactionRecorder;
use crate::domain::{
    Account, AccountStatus, AccountType, LedgerError, Money, Transaction, TransactionCategory,
    TransactionKind,
};
use crate::infrastructure::credentials::PinHasher;
use crate::infrastructure::identifiers;
use crate::infrastructure::ledger_store::{LedgerStore, LedgerUpdate};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything a completed transfer produced: both updated accounts and both
/// ledger rows, plus whether the two accounts share an owning customer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub from_account: Account,
    pub to_account: Account,
    pub out_transaction: Transaction,
    pub in_transaction: Transaction,
    /// Same owning customer on both sides. Only changes the default
    /// description wording, never authorization or accounting.
    pub internal: bool,
}

/// Owns the balance mutation rules: deposit, withdraw, transfer, account
/// opening and status transitions.
///
/// Every operation validates fully before mutating anything, and each
/// mutation lands in one atomic [`LedgerUpdate`] so the balance change and
/// its audit row commit or fail together.
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
    recorder: TransactionRecorder,
    pin_hasher: Arc<dyn PinHasher>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>, pin_hasher: Arc<dyn PinHasher>) -> Self {
        Self {
            store,
            recorder: TransactionRecorder::new(),
            pin_hasher,
        }
    }

    /// Opens an account with a generated number, zero balance and, when a
    /// PIN is supplied, an argon2 hash of it.
    pub async fn open_account(
        &self,
        customer_id: Uuid,
        account_type: AccountType,
        pin: Option<&str>,
    ) -> Result<Account, LedgerError> {
        let pin_hash = match pin {
            Some(pin) if !pin.is_empty() => Some(self.pin_hasher.hash(pin)?),
            _ => None,
        };
        let account = Account::open(
            customer_id,
            account_type,
            identifiers::account_number(),
            pin_hash,
        );
        self.store.insert_account(&account).await?;
        info!(
            account = %account.account_number,
            account_type = %account_type,
            pin_protected = account.pin_hash.is_some(),
            "opened account"
        );
        Ok(account)
    }

    pub async fn account(&self, number: &str) -> Result<Account, LedgerError> {
        self.load(number).await
    }

    pub async fn deposit(
        &self,
        number: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<(Account, Transaction), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut account = self.load_active(number).await?;
        account.credit(amount)?;

        let transaction = self.recorder.record(
            &account,
            TransactionKind::Deposit,
            amount,
            description.unwrap_or("Cash deposit"),
            TransactionCategory::Other,
            None,
            account.balance,
        );
        self.store
            .commit(
                LedgerUpdate::new()
                    .with_account(account.clone())
                    .with_transaction(transaction.clone()),
            )
            .await?;
        account.version += 1;

        info!(account = %number, amount = %amount, balance = %account.balance, "deposit committed");
        Ok((account, transaction))
    }

    pub async fn withdraw(
        &self,
        number: &str,
        amount: Money,
        pin: &str,
        description: Option<&str>,
    ) -> Result<(Account, Transaction), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut account = self.load_active(number).await?;
        self.verify_pin(&account, pin)?;
        account.debit(amount)?;

        let transaction = self.recorder.record(
            &account,
            TransactionKind::Withdrawal,
            amount,
            description.unwrap_or("Cash withdrawal"),
            TransactionCategory::Other,
            None,
            account.balance,
        );
        self.store
            .commit(
                LedgerUpdate::new()
                    .with_account(account.clone())
                    .with_transaction(transaction.clone()),
            )
            .await?;
        account.version += 1;

        info!(account = %number, amount = %amount, balance = %account.balance, "withdrawal committed");
        Ok((account, transaction))
    }

    /// Moves funds between two accounts as one atomic unit: both balance
    /// changes and both ledger rows commit together or not at all.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Money,
        pin: &str,
        description: Option<&str>,
    ) -> Result<TransferOutcome, LedgerError> {
        if from == to {
            return Err(LedgerError::SameAccountTransfer);
        }
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut source = self.load(from).await?;
        let mut destination = self.load(to).await?;
        if !source.is_active() {
            return Err(LedgerError::InactiveAccount(from.to_string()));
        }
        if !destination.is_active() {
            return Err(LedgerError::InactiveAccount(to.to_string()));
        }
        self.verify_pin(&source, pin)?;
        source.debit(amount)?;
        destination.credit(amount)?;

        let internal = source.customer_id == destination.customer_id;
        let out_description = description.map(str::to_string).unwrap_or_else(|| {
            if internal {
                format!("Transfer to your {to}")
            } else {
                format!("Transfer to {to}")
            }
        });
        let in_description = description.map(str::to_string).unwrap_or_else(|| {
            if internal {
                format!("Transfer from your {from}")
            } else {
                format!("Transfer from {from}")
            }
        });

        let out_transaction = self.recorder.record(
            &source,
            TransactionKind::TransferOut,
            amount,
            out_description,
            TransactionCategory::Other,
            Some(to.to_string()),
            source.balance,
        );
        let in_transaction = self.recorder.record(
            &destination,
            TransactionKind::TransferIn,
            amount,
            in_description,
            TransactionCategory::Other,
            Some(from.to_string()),
            destination.balance,
        );

        self.store
            .commit(
                LedgerUpdate::new()
                    .with_account(source.clone())
                    .with_account(destination.clone())
                    .with_transaction(out_transaction.clone())
                    .with_transaction(in_transaction.clone()),
            )
            .await?;
        source.version += 1;
        destination.version += 1;

        info!(
            from = %from,
            to = %to,
            amount = %amount,
            internal,
            "transfer committed"
        );
        Ok(TransferOutcome {
            from_account: source,
            to_account: destination,
            out_transaction,
            in_transaction,
            internal,
        })
    }

    /// Unconditional status transition; no balance side effects and no
    /// ledger row.
    pub async fn update_status(
        &self,
        number: &str,
        status: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let mut account = self.load(number).await?;
        account.set_status(status);
        self.store
            .commit(LedgerUpdate::new().with_account(account.clone()))
            .await?;
        account.version += 1;
        info!(account = %number, status = %status, "status updated");
        Ok(account)
    }

    async fn load(&self, number: &str) -> Result<Account, LedgerError> {
        self.store
            .account_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))
    }

    async fn load_active(&self, number: &str) -> Result<Account, LedgerError> {
        let account = self.load(number).await?;
        if !account.is_active() {
            return Err(LedgerError::InactiveAccount(number.to_string()));
        }
        Ok(account)
    }

    /// An account without a stored PIN hash is deliberately unprotected;
    /// verification only runs when a hash is present.
    fn verify_pin(&self, account: &Account, pin: &str) -> Result<(), LedgerError> {
        if let Some(hash) = &account.pin_hash {
            if !self.pin_hasher.verify(pin, hash) {
                warn!(account = %account.account_number, "PIN verification failed");
                return Err(LedgerError::InvalidPin);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::credentials::{Argon2PinHasher, MockPinHasher};
    use crate::infrastructure::memory_store::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    fn service() -> (AccountService, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = AccountService::new(store.clone(), Arc::new(Argon2PinHasher));
        (service, store)
    }

    fn money(value: rust_decimal::Decimal) -> Money {
        Money::new(value)
    }

    async fn funded_account(service: &AccountService, balance: rust_decimal::Decimal) -> Account {
        let account = service
            .open_account(Uuid::new_v4(), AccountType::Savings, None)
            .await
            .unwrap();
        service
            .deposit(&account.account_number, money(balance), Some("Opening deposit"))
            .await
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn deposit_updates_balance_and_records_snapshot() {
        let (service, store) = service();
        let account = funded_account(&service, dec!(100.00)).await;

        let (account, transaction) = service
            .deposit(&account.account_number, money(dec!(50.00)), None)
            .await
            .unwrap();

        assert_eq!(account.balance, money(dec!(150.00)));
        assert_eq!(transaction.kind, TransactionKind::Deposit);
        assert_eq!(transaction.balance_after, money(dec!(150.00)));
        assert_eq!(transaction.description, "Cash deposit");

        let rows = store.transactions(account.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].balance_after, money(dec!(150.00)));
    }

    #[tokio::test]
    async fn deposit_rejects_non_positive_amounts() {
        let (service, _) = service();
        let account = funded_account(&service, dec!(10.00)).await;
        let err = service
            .deposit(&account.account_number, Money::ZERO, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn deposit_to_suspended_account_fails() {
        let (service, _) = service();
        let account = funded_account(&service, dec!(10.00)).await;
        service
            .update_status(&account.account_number, AccountStatus::Suspended)
            .await
            .unwrap();
        let err = service
            .deposit(&account.account_number, money(dec!(5.00)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InactiveAccount(_)));
    }

    #[tokio::test]
    async fn overdraw_fails_and_leaves_no_trace() {
        let (service, store) = service();
        let account = funded_account(&service, dec!(100.00)).await;

        let err = service
            .withdraw(&account.account_number, money(dec!(150.00)), "", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: money(dec!(100.00)),
                requested: money(dec!(150.00)),
            }
        );

        let stored = store
            .account_by_number(&account.account_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.balance, money(dec!(100.00)));
        assert_eq!(store.transactions(account.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn withdrawing_the_exact_balance_succeeds() {
        let (service, _) = service();
        let account = funded_account(&service, dec!(100.00)).await;
        let (account, _) = service
            .withdraw(&account.account_number, money(dec!(100.00)), "", None)
            .await
            .unwrap();
        assert_eq!(account.balance, Money::ZERO);
    }

    #[tokio::test]
    async fn wrong_pin_fails_with_zero_side_effects() {
        let store: Arc<InMemoryLedgerStore> = Arc::new(InMemoryLedgerStore::new());
        let mut hasher = MockPinHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok("stored-hash".to_string()));
        hasher
            .expect_verify()
            .returning(|pin, hash| pin == "4921" && hash == "stored-hash");
        let service = AccountService::new(store.clone(), Arc::new(hasher));

        let account = service
            .open_account(Uuid::new_v4(), AccountType::Savings, Some("4921"))
            .await
            .unwrap();
        service
            .deposit(&account.account_number, money(dec!(100.00)), None)
            .await
            .unwrap();

        let err = service
            .withdraw(&account.account_number, money(dec!(10.00)), "0000", None)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidPin);

        let stored = store
            .account_by_number(&account.account_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.balance, money(dec!(100.00)));
        assert_eq!(store.transactions(account.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_pin_hash_skips_verification_entirely() {
        let store: Arc<InMemoryLedgerStore> = Arc::new(InMemoryLedgerStore::new());
        let mut hasher = MockPinHasher::new();
        // No PIN configured: verify must never be consulted.
        hasher.expect_verify().times(0);
        let service = AccountService::new(store, Arc::new(hasher));

        let account = service
            .open_account(Uuid::new_v4(), AccountType::Current, None)
            .await
            .unwrap();
        service
            .deposit(&account.account_number, money(dec!(20.00)), None)
            .await
            .unwrap();
        service
            .withdraw(&account.account_number, money(dec!(5.00)), "anything", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn transfer_conserves_money_and_links_counterparties() {
        let (service, _) = service();
        let customer = Uuid::new_v4();
        let from = service
            .open_account(customer, AccountType::Savings, None)
            .await
            .unwrap();
        let to = service
            .open_account(Uuid::new_v4(), AccountType::Current, None)
            .await
            .unwrap();
        service
            .deposit(&from.account_number, money(dec!(100.00)), None)
            .await
            .unwrap();
        service
            .deposit(&to.account_number, money(dec!(10.00)), None)
            .await
            .unwrap();

        let outcome = service
            .transfer(
                &from.account_number,
                &to.account_number,
                money(dec!(40.00)),
                "",
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.from_account.balance, money(dec!(60.00)));
        assert_eq!(outcome.to_account.balance, money(dec!(50.00)));
        assert!(!outcome.internal);

        assert_eq!(outcome.out_transaction.kind, TransactionKind::TransferOut);
        assert_eq!(
            outcome.out_transaction.counterparty_account_number.as_deref(),
            Some(to.account_number.as_str())
        );
        assert_eq!(outcome.out_transaction.balance_after, money(dec!(60.00)));

        assert_eq!(outcome.in_transaction.kind, TransactionKind::TransferIn);
        assert_eq!(
            outcome.in_transaction.counterparty_account_number.as_deref(),
            Some(from.account_number.as_str())
        );
        assert_eq!(outcome.in_transaction.balance_after, money(dec!(50.00)));
    }

    #[tokio::test]
    async fn internal_transfer_only_changes_the_wording() {
        let (service, _) = service();
        let customer = Uuid::new_v4();
        let from = service
            .open_account(customer, AccountType::Savings, None)
            .await
            .unwrap();
        let to = service
            .open_account(customer, AccountType::Current, None)
            .await
            .unwrap();
        service
            .deposit(&from.account_number, money(dec!(100.00)), None)
            .await
            .unwrap();

        let outcome = service
            .transfer(
                &from.account_number,
                &to.account_number,
                money(dec!(25.00)),
                "",
                None,
            )
            .await
            .unwrap();

        assert!(outcome.internal);
        assert_eq!(
            outcome.out_transaction.description,
            format!("Transfer to your {}", to.account_number)
        );
        assert_eq!(
            outcome.in_transaction.description,
            format!("Transfer from your {}", from.account_number)
        );
    }

    #[tokio::test]
    async fn same_account_transfer_is_rejected_before_any_mutation() {
        let (service, store) = service();
        let account = funded_account(&service, dec!(100.00)).await;

        let err = service
            .transfer(
                &account.account_number,
                &account.account_number,
                money(dec!(10.00)),
                "",
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::SameAccountTransfer);
        assert_eq!(err.kind(), crate::domain::ErrorKind::Conflict);

        let stored = store
            .account_by_number(&account.account_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.balance, money(dec!(100.00)));
    }

    #[tokio::test]
    async fn transfer_to_inactive_account_names_the_side() {
        let (service, _) = service();
        let from = funded_account(&service, dec!(100.00)).await;
        let to = service
            .open_account(Uuid::new_v4(), AccountType::Current, None)
            .await
            .unwrap();
        service
            .update_status(&to.account_number, AccountStatus::Closed)
            .await
            .unwrap();

        let err = service
            .transfer(
                &from.account_number,
                &to.account_number,
                money(dec!(10.00)),
                "",
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::InactiveAccount(to.account_number.clone()));
    }

    #[tokio::test]
    async fn pin_round_trips_through_argon2() {
        let (service, _) = service();
        let account = service
            .open_account(Uuid::new_v4(), AccountType::Savings, Some("4921"))
            .await
            .unwrap();
        service
            .deposit(&account.account_number, money(dec!(50.00)), None)
            .await
            .unwrap();

        assert!(matches!(
            service
                .withdraw(&account.account_number, money(dec!(10.00)), "1111", None)
                .await,
            Err(LedgerError::InvalidPin)
        ));
        service
            .withdraw(&account.account_number, money(dec!(10.00)), "4921", None)
            .await
            .unwrap();
    }
}

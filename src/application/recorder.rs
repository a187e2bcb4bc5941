use crate::domain::{Account, Money, Transaction, TransactionCategory, TransactionKind};
use crate::infrastructure::identifiers;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

/// Builds the immutable audit row for a balance mutation.
///
/// This is the sole constructor of [`Transaction`] values: every balance
/// change in the engine routes through [`TransactionRecorder::record`] so
/// each mutation has exactly one ledger row. Rows are stamped with a fresh
/// id and the current time, never backdated, never mutated.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionRecorder;

impl TransactionRecorder {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        account: &Account,
        kind: TransactionKind,
        amount: Money,
        description: impl Into<String>,
        category: TransactionCategory,
        counterparty_account_number: Option<String>,
        balance_after: Money,
    ) -> Transaction {
        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            transaction_id: identifiers::transaction_id(now),
            account_id: account.id,
            kind,
            category,
            amount,
            description: description.into(),
            counterparty_account_number,
            balance_after,
            created_at: now,
        };
        debug!(
            account = %account.account_number,
            transaction_id = %transaction.transaction_id,
            kind = %kind,
            amount = %amount,
            "recorded ledger row"
        );
        transaction
    }
}

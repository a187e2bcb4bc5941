use crate::application::recorder::TransactionRecorder;
use crate::config::InterestConfig;
use crate::domain::money::monthly_rate;
use crate::domain::{
    Account, AccountType, LedgerError, Money, TransactionCategory, TransactionKind,
};
use crate::infrastructure::ledger_store::{LedgerStore, LedgerUpdate};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Outcome counts of one accrual sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccrualSummary {
    pub credited: usize,
    /// Already credited this period, or computed interest was not positive.
    pub skipped: usize,
    pub failed: usize,
}

/// Periodic batch job crediting interest to every active account.
///
/// Each account's credit and its ledger row commit as one unit; a failure on
/// one account never aborts the sweep for the rest. Re-triggering within the
/// same accrual period is safe: an account that already holds an INTEREST
/// row for the period is skipped.
pub struct InterestEngine {
    store: Arc<dyn LedgerStore>,
    recorder: TransactionRecorder,
    config: InterestConfig,
}

impl InterestEngine {
    pub fn new(store: Arc<dyn LedgerStore>, config: InterestConfig) -> Self {
        Self {
            store,
            recorder: TransactionRecorder::new(),
            config,
        }
    }

    fn annual_rate(&self, account_type: AccountType) -> Decimal {
        match account_type {
            AccountType::Savings => self.config.savings_annual_rate,
            AccountType::Current => self.config.current_annual_rate,
        }
    }

    /// One period's interest for an account at its current balance.
    pub fn periodic_interest(&self, account: &Account) -> Money {
        account
            .balance
            .mul_rate(monthly_rate(self.annual_rate(account.account_type)))
    }

    /// Simulates `months` periods of compounding without touching the store,
    /// using the same per-period formula as the accrual job.
    pub fn project_interest(&self, account: &Account, months: u32) -> Money {
        let rate = monthly_rate(self.annual_rate(account.account_type));
        let mut balance = account.balance;
        let mut total = Money::ZERO;
        for _ in 0..months {
            let interest = balance.mul_rate(rate);
            total = total + interest;
            balance = balance + interest;
        }
        total
    }

    /// Runs one accrual sweep over all active accounts.
    pub async fn accrue(&self, now: DateTime<Utc>) -> Result<AccrualSummary, LedgerError> {
        let accounts = self.store.active_accounts().await.map_err(LedgerError::from)?;
        let (period_start, period_end) = accrual_period(now, self.config.accrual_period_months);

        let mut summary = AccrualSummary::default();
        for mut account in accounts {
            match self.credit_one(&mut account, period_start, period_end).await {
                Ok(true) => summary.credited += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        account = %account.account_number,
                        error = %e,
                        "interest credit failed, continuing sweep"
                    );
                    summary.failed += 1;
                }
            }
        }
        info!(
            credited = summary.credited,
            skipped = summary.skipped,
            failed = summary.failed,
            "interest accrual sweep finished"
        );
        Ok(summary)
    }

    async fn credit_one(
        &self,
        account: &mut Account,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let existing = self
            .store
            .transactions_in_range(account.id, period_start, period_end)
            .await?;
        if existing
            .iter()
            .any(|t| t.kind == TransactionKind::Interest)
        {
            return Ok(false);
        }

        let interest = self.periodic_interest(account);
        if !interest.is_positive() {
            return Ok(false);
        }

        account.credit(interest)?;
        let transaction = self.recorder.record(
            account,
            TransactionKind::Interest,
            interest,
            "Monthly interest credit",
            TransactionCategory::Other,
            None,
            account.balance,
        );
        self.store
            .commit(
                LedgerUpdate::new()
                    .with_account(account.clone())
                    .with_transaction(transaction),
            )
            .await?;
        account.version += 1;
        Ok(true)
    }

    /// Spawns the externally driven trigger: a timer loop invoking one sweep
    /// per tick. The period-guard in `accrue` makes overlapping or early
    /// ticks harmless.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = self.accrue(Utc::now()).await {
                    error!(error = %e, "interest accrual sweep failed");
                }
            }
        })
    }
}

/// The accrual period containing `now`: calendar months tiled from January,
/// `period_months` wide, as a half-open UTC interval.
fn accrual_period(now: DateTime<Utc>, period_months: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let months = period_months.max(1).min(12);
    let start_month0 = now.month0() - now.month0() % months;
    let (end_year, end_month0) = if start_month0 + months >= 12 {
        (now.year() + 1, (start_month0 + months) % 12)
    } else {
        (now.year(), start_month0 + months)
    };

    // Month numbers are always 1..=12 here, so these dates always exist.
    let start = NaiveDate::from_ymd_opt(now.year(), start_month0 + 1, 1)
        .unwrap_or(now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();
    let end = NaiveDate::from_ymd_opt(end_year, end_month0 + 1, 1)
        .unwrap_or(now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, end)
}

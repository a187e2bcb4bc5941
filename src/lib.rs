pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{
    AccountService, AccrualSummary, InterestEngine, StatementReader, TransactionRecorder,
    TransferOutcome,
};
pub use config::InterestConfig;
pub use domain::{
    Account, AccountStatus, AccountType, ErrorKind, LedgerError, Money, Transaction,
    TransactionCategory, TransactionKind,
};
pub use infrastructure::{
    Argon2PinHasher, InMemoryLedgerStore, LedgerStore, LedgerStoreError, LedgerUpdate,
    PgLedgerStore, PinHasher,
};

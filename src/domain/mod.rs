pub mod account;
pub mod error;
pub mod money;
pub mod transaction;

pub use account::{Account, AccountStatus, AccountType};
pub use error::{ErrorKind, LedgerError};
pub use money::Money;
pub use transaction::{Transaction, TransactionCategory, TransactionKind};

pub mod credentials;
pub mod identifiers;
pub mod ledger_store;
pub mod logging;
pub mod memory_store;
pub mod postgres_store;

pub use credentials::{Argon2PinHasher, PinHasher};
pub use ledger_store::{LedgerStore, LedgerStoreError, LedgerUpdate};
pub use logging::{init_logging, LoggingConfig};
pub use memory_store::InMemoryLedgerStore;
pub use postgres_store::PgLedgerStore;

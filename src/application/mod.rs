pub mod account_service;
pub mod interest;
pub mod recorder;
pub mod statements;

pub use account_service::{AccountService, TransferOutcome};
pub use interest::{AccrualSummary, InterestEngine};
pub use recorder::TransactionRecorder;
pub use statements::StatementReader;

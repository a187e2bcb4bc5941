use chrono::{DateTime, Utc};
use rand::Rng;

/// Generates a human-legible account number: `ACC` plus ten digits.
pub fn account_number() -> String {
    let digits = rand::thread_rng().gen_range(1_000_000_000u64..=9_999_999_999u64);
    format!("ACC{digits:010}")
}

/// Generates a time-derived transaction id. The random suffix keeps ids
/// unique when two transactions land within the same millisecond.
pub fn transaction_id(at: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("TXN{}{suffix:04}", at.timestamp_millis())
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Interest rate table and accrual period.
///
/// Two-tier annual rates: savings accounts earn the higher rate, current
/// accounts the lower one. The accrual period defaults to one calendar
/// month.
#[derive(Debug, Clone, Deserialize)]
pub struct InterestConfig {
    pub savings_annual_rate: Decimal,
    pub current_annual_rate: Decimal,
    pub accrual_period_months: u32,
}

impl Default for InterestConfig {
    fn default() -> Self {
        Self {
            savings_annual_rate: dec!(0.04),
            current_annual_rate: dec!(0.01),
            accrual_period_months: 1,
        }
    }
}

impl InterestConfig {
    /// Reads overrides from `LEDGER_SAVINGS_ANNUAL_RATE`,
    /// `LEDGER_CURRENT_ANNUAL_RATE` and `LEDGER_ACCRUAL_PERIOD_MONTHS`,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            savings_annual_rate: env_or("LEDGER_SAVINGS_ANNUAL_RATE", defaults.savings_annual_rate),
            current_annual_rate: env_or("LEDGER_CURRENT_ANNUAL_RATE", defaults.current_annual_rate),
            accrual_period_months: env_or(
                "LEDGER_ACCRUAL_PERIOD_MONTHS",
                defaults.accrual_period_months,
            ),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_rate_table() {
        let config = InterestConfig::default();
        assert_eq!(config.savings_annual_rate, dec!(0.04));
        assert_eq!(config.current_annual_rate, dec!(0.01));
        assert_eq!(config.accrual_period_months, 1);
    }
}

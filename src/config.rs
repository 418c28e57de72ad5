use std::{collections::HashMap, env};

use anyhow::Context;
use chrono::{FixedOffset, NaiveDate, Utc};

use crate::domain::PaymentMethod;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Shared secret the payment provider sends with status callbacks.
    pub payment_notify_secret: String,
    pub run_migrations: bool,
    pub booking: BookingPolicy,
}

/// Money and calendar rules applied by the booking and invoice services.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Offset whose calendar day counts as "today" for date validation and
    /// code generation.
    pub utc_offset: FixedOffset,
    pub vat_percent: i64,
    pub default_deposit_percent: i64,
    pub deposit_overrides: HashMap<PaymentMethod, i64>,
    pub invoice_due_days: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(7 * 3600).expect("+07:00 is a valid offset"),
            vat_percent: 10,
            default_deposit_percent: 30,
            deposit_overrides: HashMap::from([(PaymentMethod::Momo, 100)]),
            invoice_due_days: 0,
        }
    }
}

impl BookingPolicy {
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    pub fn deposit_percent(&self, method: PaymentMethod) -> i64 {
        self.deposit_overrides
            .get(&method)
            .copied()
            .unwrap_or(self.default_deposit_percent)
    }

    /// Parses `momo=100,cash=30` into per-method deposit percentages.
    pub fn parse_deposit_overrides(raw: &str) -> anyhow::Result<HashMap<PaymentMethod, i64>> {
        let mut overrides = HashMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (method, percent) = pair
                .split_once('=')
                .with_context(|| format!("invalid DEPOSIT_POLICY entry `{pair}`"))?;
            let method: PaymentMethod = method.trim().parse()?;
            let percent: i64 = percent
                .trim()
                .parse()
                .with_context(|| format!("invalid deposit percent in `{pair}`"))?;
            anyhow::ensure!(
                (0..=100).contains(&percent),
                "deposit percent must be within 0..=100, got {percent}"
            );
            overrides.insert(method, percent);
        }
        Ok(overrides)
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let payment_notify_secret = env::var("PAYMENT_NOTIFY_SECRET")
            .context("PAYMENT_NOTIFY_SECRET is not set")?;
        anyhow::ensure!(
            !payment_notify_secret.trim().is_empty(),
            "PAYMENT_NOTIFY_SECRET must not be empty"
        );
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let run_migrations = env::var("RUN_MIGRATIONS")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            payment_notify_secret,
            run_migrations,
            booking: BookingPolicy::from_env()?,
        })
    }
}

impl BookingPolicy {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let utc_offset = match env::var("RESORT_UTC_OFFSET_HOURS") {
            Ok(raw) => {
                let hours: i32 = raw.parse().context("RESORT_UTC_OFFSET_HOURS must be an integer")?;
                FixedOffset::east_opt(hours * 3600)
                    .with_context(|| format!("RESORT_UTC_OFFSET_HOURS out of range: {hours}"))?
            }
            Err(_) => defaults.utc_offset,
        };
        let vat_percent = int_var("VAT_PERCENT", defaults.vat_percent)?;
        let default_deposit_percent =
            int_var("DEFAULT_DEPOSIT_PERCENT", defaults.default_deposit_percent)?;
        let deposit_overrides = match env::var("DEPOSIT_POLICY") {
            Ok(raw) => Self::parse_deposit_overrides(&raw)?,
            Err(_) => defaults.deposit_overrides,
        };
        let invoice_due_days = int_var("INVOICE_DUE_DAYS", defaults.invoice_due_days)?;

        Ok(Self {
            utc_offset,
            vat_percent,
            default_deposit_percent,
            deposit_overrides,
            invoice_due_days,
        })
    }
}

fn int_var(name: &str, default: i64) -> anyhow::Result<i64> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be an integer, got `{raw}`")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_policy_falls_back_to_default_percent() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.deposit_percent(PaymentMethod::Momo), 100);
        assert_eq!(policy.deposit_percent(PaymentMethod::Cash), 30);
        assert_eq!(policy.deposit_percent(PaymentMethod::CreditCard), 30);
    }

    #[test]
    fn parses_deposit_overrides() {
        let parsed = BookingPolicy::parse_deposit_overrides("momo=100, bank_transfer = 50,").unwrap();
        assert_eq!(parsed.get(&PaymentMethod::Momo), Some(&100));
        assert_eq!(parsed.get(&PaymentMethod::BankTransfer), Some(&50));
        assert_eq!(parsed.len(), 2);

        assert!(BookingPolicy::parse_deposit_overrides("paypal=10").is_err());
        assert!(BookingPolicy::parse_deposit_overrides("cash=150").is_err());
        assert!(BookingPolicy::parse_deposit_overrides("cash").is_err());
    }
}

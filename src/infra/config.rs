use std::path::PathBuf;

use env_helpers::get_env_default;
use secrecy::SecretString;

use crate::{domain::entities::date_key::DateKeyFormat, infra::error::InfraError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("expected redis or memory, got {s}")),
        }
    }
}

pub struct AppConfig {
    pub store_backend: StoreBackend,
    /// Only read when `store_backend` is redis. May carry a password.
    pub redis_url: SecretString,
    /// Date encoding of schedule bucket keys. Must match what the store already holds.
    pub schedule_key_format: DateKeyFormat,
    pub generation_poll_secs: u64,
    pub payment_retry_interval_secs: u64,
    pub max_payment_retries: u32,
    /// Optional JSON log file next to the console output.
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let store_backend = parse_var(
            "STORE_BACKEND",
            get_env_default("STORE_BACKEND", "memory".to_string()),
        )?;
        let redis_url: SecretString = SecretString::new(
            get_env_default::<String>("REDIS_URL", "redis://127.0.0.1:6379".to_string()).into(),
        );
        let schedule_key_format = parse_var(
            "SCHEDULE_KEY_FORMAT",
            get_env_default("SCHEDULE_KEY_FORMAT", "iso".to_string()),
        )?;
        let generation_poll_secs: u64 = get_env_default("GENERATION_POLL_SECS", 3600);
        let payment_retry_interval_secs: u64 = get_env_default("PAYMENT_RETRY_INTERVAL_SECS", 900);
        let max_payment_retries: u32 = get_env_default("MAX_PAYMENT_RETRIES", 5);
        let log_file: Option<PathBuf> = std::env::var("LOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        require_positive("GENERATION_POLL_SECS", generation_poll_secs)?;
        require_positive("PAYMENT_RETRY_INTERVAL_SECS", payment_retry_interval_secs)?;
        // Zero would leave the retry job only counting exhausted invoices
        require_positive("MAX_PAYMENT_RETRIES", u64::from(max_payment_retries))?;

        Ok(Self {
            store_backend,
            redis_url,
            schedule_key_format,
            generation_poll_secs,
            payment_retry_interval_secs,
            max_payment_retries,
            log_file,
        })
    }
}

fn parse_var<T>(var: &'static str, raw: String) -> Result<T, InfraError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
        .map_err(|reason| InfraError::ConfigInvalid { var, reason })
}

fn require_positive(var: &'static str, value: u64) -> Result<(), InfraError> {
    if value == 0 {
        return Err(InfraError::ConfigInvalid {
            var,
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

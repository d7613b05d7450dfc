use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CustodyError;

/// Ten years.
pub const DEFAULT_MAX_LOCK_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Custody engine configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// min_deposit_minor = 100
/// max_lock_duration_secs = 31536000
/// journal_capacity = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    /// Smallest accepted deposit, in minor units.
    pub min_deposit_minor: u64,
    /// Longest accepted lock duration for a single lock deposit.
    pub max_lock_duration_secs: u64,
    /// Per-ledger journal retention; `None` keeps every event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_capacity: Option<usize>,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            min_deposit_minor: 1,
            max_lock_duration_secs: DEFAULT_MAX_LOCK_DURATION_SECS,
            journal_capacity: None,
        }
    }
}

impl CustodyConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, CustodyError> {
        let config: CustodyConfig =
            toml::from_str(contents).map_err(|e| CustodyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CustodyError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CustodyError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), CustodyError> {
        if self.min_deposit_minor == 0 {
            return Err(CustodyError::Config(
                "min_deposit_minor must be at least 1".to_string(),
            ));
        }
        if self.max_lock_duration_secs == 0 {
            return Err(CustodyError::Config(
                "max_lock_duration_secs must be positive".to_string(),
            ));
        }
        if i64::try_from(self.max_lock_duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .is_none()
        {
            return Err(CustodyError::Config(format!(
                "max_lock_duration_secs {} is out of range",
                self.max_lock_duration_secs
            )));
        }
        if self.journal_capacity == Some(0) {
            return Err(CustodyError::Config(
                "journal_capacity must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Check a requested lock duration against this configuration.
    pub fn check_lock_duration(&self, lock_duration: Duration) -> Result<(), CustodyError> {
        if lock_duration < Duration::zero() {
            return Err(CustodyError::InvalidLockDuration(format!(
                "lock duration must not be negative, got {}s",
                lock_duration.num_seconds()
            )));
        }
        if lock_duration > self.max_lock_duration() {
            return Err(CustodyError::LockTooLong {
                requested_secs: lock_duration.num_seconds(),
                max_secs: self.max_lock_duration_secs,
            });
        }
        Ok(())
    }

    pub fn max_lock_duration(&self) -> Duration {
        i64::try_from(self.max_lock_duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    pub fn check_amount(&self, amount: u64) -> Result<(), CustodyError> {
        if amount < self.min_deposit_minor {
            return Err(CustodyError::InvalidAmount {
                amount,
                minimum: self.min_deposit_minor,
            });
        }
        Ok(())
    }
}

//! Pool configuration types

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for a resource pool
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Name used in logs, events and errors
    pub name: String,
    /// Maximum number of resources (pending + idle + active)
    pub max_size: usize,
    /// Idle age after which the reaper destroys a resource
    pub idle_timeout: Duration,
    /// How often the reaper scans idle resources
    pub reap_interval: Duration,
    /// Number of priority buckets available to acquire callers
    pub priority_range: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            max_size: 10,
            idle_timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(1),
            priority_range: 1,
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::configuration("max_size must be greater than 0"));
        }
        if self.priority_range == 0 {
            return Err(Error::configuration(
                "priority_range must be greater than 0",
            ));
        }
        if self.reap_interval.is_zero() {
            return Err(Error::configuration(
                "reap_interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_size, 10);
        assert_eq!(config.priority_range, 1);
        assert_eq!(config.reap_interval, Duration::from_secs(1));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_config_validation() {
        assert!(PoolConfig { max_size: 0, ..Default::default() }.validate().is_err());
        assert!(PoolConfig { priority_range: 0, ..Default::default() }.validate().is_err());
        assert!(PoolConfig { reap_interval: Duration::ZERO, ..Default::default() }.validate().is_err());
        assert!(PoolConfig { idle_timeout: Duration::ZERO, ..Default::default() }.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_fills_missing_fields_with_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"name":"db","max_size":2,"priority_range":3}"#).unwrap();
        assert_eq!(config.name, "db");
        assert_eq!(config.max_size, 2);
        assert_eq!(config.priority_range, 3);
        assert_eq!(config.reap_interval, Duration::from_secs(1));
    }
}

//! # Store Configuration
//!
//! Deployment configuration loaded from `BOUTIK_*` environment variables,
//! with a default for every value.
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ Variable                     │ Default                                  │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │ BOUTIK_DB_PATH               │ ./boutik.db                              │
//! │ BOUTIK_MAX_CONNECTIONS       │ 5                                        │
//! │ BOUTIK_TENANT_ID             │ DEFAULT_TENANT_ID                        │
//! │ BOUTIK_CURRENCY              │ XOF                                      │
//! │ BOUTIK_ENFORCE_CREDIT_LIMIT  │ false                                    │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use boutik_core::settlement::CheckoutPolicy;
use boutik_core::{Currency, DEFAULT_TENANT_ID};

use crate::pool::DbConfig;

/// Deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// Tenant served by this deployment.
    pub tenant_id: String,

    /// Currency used until the tenant saves its own settings.
    pub currency: Currency,

    /// Reject sales pushing a customer above their credit limit.
    pub enforce_credit_limit: bool,
}

impl StoreConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's
    /// value or `None` when unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = StoreConfig {
            database_path: lookup("BOUTIK_DB_PATH")
                .unwrap_or_else(|| "./boutik.db".to_string())
                .into(),

            max_connections: lookup("BOUTIK_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOUTIK_MAX_CONNECTIONS".to_string()))?,

            tenant_id: lookup("BOUTIK_TENANT_ID")
                .unwrap_or_else(|| DEFAULT_TENANT_ID.to_string()),

            currency: lookup("BOUTIK_CURRENCY")
                .unwrap_or_else(|| "XOF".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOUTIK_CURRENCY".to_string()))?,

            enforce_credit_limit: parse_bool(
                lookup("BOUTIK_ENFORCE_CREDIT_LIMIT").as_deref(),
            )
            .ok_or_else(|| ConfigError::InvalidValue("BOUTIK_ENFORCE_CREDIT_LIMIT".to_string()))?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "BOUTIK_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.tenant_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("BOUTIK_TENANT_ID".to_string()));
        }

        Ok(config)
    }

    /// Pool configuration for this deployment.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            enforce_credit_limit: self.enforce_credit_limit,
        }
    }
}

/// Unset means false.
fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Some(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./boutik.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(config.currency, Currency::Xof);
        assert!(!config.enforce_credit_limit);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BOUTIK_DB_PATH", "/var/lib/boutik/store.db"),
            ("BOUTIK_MAX_CONNECTIONS", "8"),
            ("BOUTIK_CURRENCY", "ngn"),
            ("BOUTIK_ENFORCE_CREDIT_LIMIT", "true"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.currency, Currency::Ngn);
        assert!(config.checkout_policy().enforce_credit_limit);

        let db = config.to_db_config();
        assert_eq!(db.database_path, PathBuf::from("/var/lib/boutik/store.db"));
        assert_eq!(db.max_connections, 8);
    }

    #[test]
    fn test_invalid_values() {
        for (var, value) in [
            ("BOUTIK_MAX_CONNECTIONS", "many"),
            ("BOUTIK_MAX_CONNECTIONS", "0"),
            ("BOUTIK_CURRENCY", "USD"),
            ("BOUTIK_ENFORCE_CREDIT_LIMIT", "maybe"),
            ("BOUTIK_TENANT_ID", "  "),
        ] {
            match load(&[(var, value)]) {
                Err(ConfigError::InvalidValue(name)) => assert_eq!(name, var),
                other => panic!("{}={} gave {:?}", var, value, other),
            }
        }
    }
}

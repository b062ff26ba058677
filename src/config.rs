//! Monitor configuration file (JSON)
//!
//! A missing file is replaced by a default configuration written to disk.

use crate::error::{Error, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredProduct {
    pub product_code: String,
    pub product_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredStore {
    pub store_code: String,
    pub store_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// JSON webhook receiving restock alerts; alerts are only logged when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub products_to_monitor: Vec<MonitoredProduct>,
    #[serde(default)]
    pub stores_to_monitor: Vec<MonitoredStore>,
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
    /// Postal code sent with availability lookups
    #[serde(default = "default_location")]
    pub location: String,
    /// IANA timezone used for weekday/hour statistics
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Pause between two availability lookups
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_check_interval() -> u64 {
    10
}

fn default_location() -> String {
    "10001".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_request_delay() -> u64 {
    1000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            products_to_monitor: Vec::new(),
            stores_to_monitor: Vec::new(),
            check_interval_minutes: default_check_interval(),
            location: default_location(),
            timezone: default_timezone(),
            request_delay_ms: default_request_delay(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load the config, writing a default one if the file does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            log::info!("Created default config: {}", path.display());
            return Ok(config);
        }

        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.timezone()?;
        log::debug!(
            "Loaded config: {} product(s), {} store(s)",
            config.products_to_monitor.len(),
            config.stores_to_monitor.len()
        );
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone: {}", self.timezone)))
    }

    /// A check cycle needs at least one product and one store
    pub fn validate_for_checks(&self) -> Result<()> {
        if self.products_to_monitor.is_empty() {
            return Err(Error::Config("no products configured for monitoring".to_string()));
        }
        if self.stores_to_monitor.is_empty() {
            return Err(Error::Config("no stores configured for monitoring".to_string()));
        }
        if self.check_interval_minutes == 0 {
            return Err(Error::Config("check_interval_minutes must be positive".to_string()));
        }
        Ok(())
    }

    /// Add a product unless its code is already monitored. Returns whether it was added.
    pub fn add_product(&mut self, product_code: &str, product_name: &str) -> bool {
        if self
            .products_to_monitor
            .iter()
            .any(|p| p.product_code == product_code)
        {
            return false;
        }
        self.products_to_monitor.push(MonitoredProduct {
            product_code: product_code.to_string(),
            product_name: product_name.to_string(),
        });
        true
    }

    /// Add a store unless its code is already monitored. Returns whether it was added.
    pub fn add_store(&mut self, store_code: &str, store_name: &str) -> bool {
        if self
            .stores_to_monitor
            .iter()
            .any(|s| s.store_code == store_code)
        {
            return false;
        }
        self.stores_to_monitor.push(MonitoredStore {
            store_code: store_code.to_string(),
            store_name: store_name.to_string(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_creates_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = MonitorConfig::load_or_create(&path).unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert!(path.exists());
        assert_eq!(config.check_interval_minutes, 10);
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "products_to_monitor": [
                    {"product_code": "MU2F3LL/A", "product_name": "iPhone 15 Pro 128GB"}
                ],
                "stores_to_monitor": [
                    {"store_code": "R090", "store_name": "Washington Square"}
                ],
                "timezone": "America/Los_Angeles",
                "notifications": {"webhook_url": "http://localhost:5000/notify"}
            }"#,
        )
        .unwrap();

        let config = MonitorConfig::load_or_create(&path).unwrap();
        assert_eq!(config.products_to_monitor[0].product_code, "MU2F3LL/A");
        assert_eq!(config.stores_to_monitor[0].store_name, "Washington Square");
        assert_eq!(config.location, "10001");
        assert_eq!(config.request_delay_ms, 1000);
        assert_eq!(
            config.notifications.webhook_url.as_deref(),
            Some("http://localhost:5000/notify")
        );
        assert!(config.validate_for_checks().is_ok());
    }

    #[test]
    fn unknown_timezone_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"timezone": "Mars/Olympus_Mons"}"#).unwrap();

        assert!(matches!(
            MonitorConfig::load_or_create(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn empty_config_cannot_run_checks() {
        let config = MonitorConfig::default();
        assert!(matches!(config.validate_for_checks(), Err(Error::Config(_))));
    }

    #[test]
    fn add_product_and_store_skip_duplicates() {
        let mut config = MonitorConfig::default();
        assert!(config.add_product("MU2F3LL/A", "iPhone 15 Pro"));
        assert!(!config.add_product("MU2F3LL/A", "iPhone 15 Pro (again)"));
        assert!(config.add_store("R090", "Washington Square"));
        assert!(!config.add_store("R090", "Washington Square"));

        assert_eq!(config.products_to_monitor.len(), 1);
        assert_eq!(config.stores_to_monitor.len(), 1);
    }

    #[test]
    fn save_and_reload_preserves_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = MonitorConfig::default();
        config.add_product("MU2F3LL/A", "iPhone 15 Pro");
        config.save(&path).unwrap();

        assert_eq!(MonitorConfig::load_or_create(&path).unwrap(), config);
    }
}

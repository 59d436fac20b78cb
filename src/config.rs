//! Configuration for sheet-ledger
//!
//! Everything is optional; a missing default config file means defaults.
//! Lookup order: `--config <path>`, `$SHEET_LEDGER_CONFIG`, then
//! `<config dir>/sheet-ledger/config.toml`.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LedgerError;

pub const CONFIG_ENV_VAR: &str = "SHEET_LEDGER_CONFIG";

/// Names of the three sheets inside the workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub products: String,
    pub customers: String,
    pub orders: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        SheetNames {
            products: "Товары".to_string(),
            customers: "Клиенты".to_string(),
            orders: "Заявки".to_string(),
        }
    }
}

/// How the persistence gateway treats the backing file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistOptions {
    /// Copy the file aside once per session before the first write
    pub backup_before_write: bool,
    /// Refuse to write when the file changed since it was loaded or last flushed
    pub verify_checksum: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub sheets: SheetNames,
    /// chrono format string used when printing order dates
    pub date_format: String,
    pub persistence: PersistOptions,
    /// tracing filter directive, overridden by RUST_LOG
    pub log_filter: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            sheets: SheetNames::default(),
            date_format: "%d.%m.%Y".to_string(),
            persistence: PersistOptions::default(),
            log_filter: None,
        }
    }
}

impl LedgerConfig {
    /// Load from an explicit path, the env override, or the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self, LedgerError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, LedgerError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            toml::from_str(text).map_err(|e| LedgerError::Config(e.to_string()))?;

        if config.date_format.trim().is_empty() {
            return Err(LedgerError::Config("date_format must not be empty".to_string()));
        }

        if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(LedgerError::Config(format!(
                "date_format '{}' is not a valid chrono format",
                config.date_format
            )));
        }

        Ok(config)
    }
}

/// `<config dir>/sheet-ledger/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sheet-ledger").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = LedgerConfig::from_toml("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.sheets.customers, "Клиенты");
    }

    #[test]
    fn test_partial_config() {
        let config = LedgerConfig::from_toml(
            r#"
            date_format = "%Y-%m-%d"

            [sheets]
            products = "Products"

            [persistence]
            verify_checksum = true
            "#,
        )
        .unwrap();

        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.sheets.products, "Products");
        assert_eq!(config.sheets.orders, "Заявки");
        assert!(config.persistence.verify_checksum);
        assert!(!config.persistence.backup_before_write);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LedgerConfig::from_toml("date_format = 5"),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml("date_format = \"  \""),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml("date_format = \"%Q\""),
            Err(LedgerError::Config(_))
        ));
        assert!(LedgerConfig::from_toml("date_format = \"%d/%m/%y\"").is_ok());
    }

    #[test]
    fn test_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        std::fs::write(&path, "[sheets]\ncustomers = \"Clients\"\n").unwrap();

        let config = LedgerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sheets.customers, "Clients");

        let missing = dir.path().join("missing.toml");
        assert!(LedgerConfig::load(Some(&missing)).is_err());
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::schema::Table;

/// Process-wide settings consumed by the composers.
///
/// The value is immutable once loaded and is passed by reference into every
/// call that needs a physical table name or a date output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Prepended to every physical table name.
    pub table_prefix: String,
    /// Logical table name -> physical table name overrides.
    pub tables: BTreeMap<String, String>,
    /// `DATE_FORMAT` pattern for the per-day history view.
    pub date_format: String,
    /// `DATE_FORMAT` pattern for the per-month history view.
    pub month_format: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            tables: BTreeMap::new(),
            date_format: String::from("%d-%m-%Y"),
            month_format: String::from("%m-%Y"),
        }
    }
}

impl BuilderConfig {
    /// Physical, prefixed name of a logical table.
    pub fn table_name(&self, table: Table) -> String {
        let physical = self
            .tables
            .get(table.as_str())
            .map(String::as_str)
            .unwrap_or_else(|| table.default_name());
        format!("{}{}", self.table_prefix, physical)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BuilderConfig =
            toml::from_str(content).context("Failed to parse builder configuration")?;
        Ok(config)
    }

    pub fn get_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adsql")
            .join("config.toml")
    }

    /// Load the configuration file, falling back to defaults when it is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no builder config, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

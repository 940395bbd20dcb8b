//! Query Configuration
//!
//! Pagination defaults applied by the normalizer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A page setting is zero
    #[error("Invalid config: {0} must be at least 1")]
    ZeroValue(&'static str),
}

/// Normalizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page used when `page[number]` is missing (default: 1)
    #[serde(default = "default_page")]
    pub default_page: u64,

    /// Page size used when `page[size]` is missing (default: 20)
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound for `page[size]`; unbounded when absent
    #[serde(default)]
    pub max_page_size: Option<u64>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page: default_page(),
            default_page_size: default_page_size(),
            max_page_size: None,
        }
    }
}

impl QueryConfig {
    /// Loads and validates a JSON configuration file; missing keys take
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects page settings of zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page == 0 {
            return Err(ConfigError::ZeroValue("default_page"));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::ZeroValue("default_page_size"));
        }
        if self.max_page_size == Some(0) {
            return Err(ConfigError::ZeroValue("max_page_size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = QueryConfig::default();
        assert_eq!(config.default_page, 1);
        assert_eq!(config.default_page_size, 20);
        assert!(config.max_page_size.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: QueryConfig = serde_json::from_str(r#"{"default_page_size": 50}"#).unwrap();
        assert_eq!(config.default_page, 1);
        assert_eq!(config.default_page_size, 50);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_page_size": 100}}"#).unwrap();

        let config = QueryConfig::load(file.path()).unwrap();
        assert_eq!(config.max_page_size, Some(100));
        assert_eq!(config.default_page_size, 20);
    }

    fn load_str(json: &str) -> Result<QueryConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        QueryConfig::load(file.path())
    }

    #[test]
    fn test_zero_values_rejected() {
        for key in ["default_page", "default_page_size", "max_page_size"] {
            let err = load_str(&format!(r#"{{"{}": 0}}"#, key)).unwrap_err();
            assert!(matches!(&err, ConfigError::ZeroValue(k) if *k == key));
            assert_eq!(err.to_string(), format!("Invalid config: {} must be at least 1", key));
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(QueryConfig::default().validate().is_ok());
        assert!(matches!(load_str("{"), Err(ConfigError::Malformed(_))));
    }
}

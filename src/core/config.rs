use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::currency::CurrencyCode;

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate-api.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Currencies preselected when the user does not name them.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DefaultsConfig {
    #[serde(default = "DefaultsConfig::default_source")]
    pub source: CurrencyCode,
    #[serde(default = "DefaultsConfig::default_target")]
    pub target: CurrencyCode,
}

impl DefaultsConfig {
    fn default_source() -> CurrencyCode {
        CurrencyCode::Usd
    }

    fn default_target() -> CurrencyCode {
        CurrencyCode::Eur
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            source: Self::default_source(),
            target: Self::default_target(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fxconv", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        // An empty file is a valid "all defaults" config
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        // A zero reqwest timeout fails every request before it is sent
        anyhow::ensure!(
            self.provider.timeout_secs > 0,
            "provider.timeout_secs must be greater than zero"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
provider:
  base_url: "http://example.com/rates"
  api_key: "secret"
  timeout_secs: 2
defaults:
  source: pln
  target: GBP
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.provider.base_url, "http://example.com/rates");
        assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
        assert_eq!(config.provider.timeout(), Duration::from_secs(2));
        assert_eq!(config.defaults.source, CurrencyCode::Pln);
        assert_eq!(config.defaults.target, CurrencyCode::Gbp);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml_str = r#"
provider:
  api_key: "secret"
defaults:
  target: CHF
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.defaults.source, CurrencyCode::Usd);
        assert_eq!(config.defaults.target, CurrencyCode::Chf);
    }

    #[test]
    fn test_unsupported_default_currency_is_rejected() {
        let yaml_str = "defaults:\n  source: JPY\n";
        let result = serde_yaml::from_str::<AppConfig>(yaml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "provider:\n  base_url: http://localhost:1234")?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.provider.base_url, "http://localhost:1234");
        assert_eq!(config.defaults, DefaultsConfig::default());

        let empty = tempfile::NamedTempFile::new()?;
        assert_eq!(AppConfig::load_from_path(empty.path())?, AppConfig::default());

        let mut zero_timeout = tempfile::NamedTempFile::new()?;
        writeln!(zero_timeout, "provider:\n  timeout_secs: 0")?;
        let err = AppConfig::load_from_path(zero_timeout.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config file"));
        assert_eq!(
            err.root_cause().to_string(),
            "provider.timeout_secs must be greater than zero"
        );

        let missing = AppConfig::load_from_path("/definitely/not/here/config.yaml");
        assert!(
            missing
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
        Ok(())
    }
}

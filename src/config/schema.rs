//! Configuration schema for prebuild
//!
//! Configuration is stored at `~/.config/prebuild/config.toml`

use crate::bundle::DEFAULT_ROOT_LIBRARIES;
use crate::lock::DEFAULT_POLL_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location and locking
    pub cache: CacheConfig,

    /// Package-manager install settings
    pub provision: ProvisionConfig,

    /// Android bundle settings
    pub bundle: BundleConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache base directory. `PREBUILD_CACHE_BASE` takes precedence.
    pub base_dir: Option<PathBuf>,

    /// Seconds between lock acquisition attempts
    pub lock_poll_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            lock_poll_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

/// Provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Dependency set passed to the package manager
    pub dependency_set: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            dependency_set: "hifi-client-deps".to_string(),
        }
    }
}

/// Android bundle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Root libraries the bundle closure starts from
    pub libraries: Vec<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            libraries: DEFAULT_ROOT_LIBRARIES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[provision]"));
        assert!(toml.contains("hifi-client-deps"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.lock_poll_secs, 10);
        assert!(config.cache.base_dir.is_none());
        assert_eq!(config.bundle.libraries.len(), DEFAULT_ROOT_LIBRARIES.len());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            base_dir = "/var/cache/prebuild"

            [bundle]
            libraries = ["Qt5Core", "Qt5Gui"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.base_dir, Some(PathBuf::from("/var/cache/prebuild")));
        assert_eq!(config.cache.lock_poll_secs, 10); // default preserved
        assert_eq!(config.bundle.libraries, vec!["Qt5Core", "Qt5Gui"]);
        assert_eq!(config.general.log_format, "text");
    }
}

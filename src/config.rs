//! Configuration for the politeness engine.
//!
//! Everything the engine needs - cache root, freshness window, cooldowns,
//! HTTP identity - is explicit construction-time configuration. No globals.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default robots.txt freshness window in hours.
pub const DEFAULT_FRESHNESS_HOURS: u64 = 24;

/// Engine-wide configuration, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolitenessConfig {
    /// Directory holding cached robots.txt files.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Maximum age of a cached robots.txt before re-fetch.
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u64,
    /// Minimum spacing between completed actions for the same domain.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// How long `stop_processing` waits for in-flight work before aborting it.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// User agent sent on robots.txt fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("robots-cache")
}

fn default_freshness_hours() -> u64 {
    DEFAULT_FRESHNESS_HOURS
}

fn default_cooldown_ms() -> u64 {
    2000
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("pricecrawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            freshness_hours: default_freshness_hours(),
            cooldown_ms: default_cooldown_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl PolitenessConfig {
    /// Load configuration from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_hours * 3600)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PolitenessConfig::default();
        assert_eq!(config.freshness_hours, 24);
        assert_eq!(config.freshness_window(), Duration::from_secs(86400));
        assert_eq!(config.cooldown(), Duration::from_millis(2000));
        assert!(config.user_agent.starts_with("pricecrawl/"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: PolitenessConfig =
            toml::from_str("cooldown_ms = 250\ncache_dir = \"/tmp/robots\"").unwrap();
        assert_eq!(config.cooldown(), Duration::from_millis(250));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/robots"));
        assert_eq!(config.freshness_hours, DEFAULT_FRESHNESS_HOURS);
    }
}

//! Configuration for the bridge, loadable from TOML.
//!
//! Every key is optional; anything missing falls back to the defaults below.
//!
//! ```toml
//! api_base = "https://textbook.example.org/api/v1"
//! request_timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! max_delay_ms = 16000
//!
//! [throttle]
//! min_interval_ms = 500
//!
//! [content]
//! default_locale = "en"
//! user_id = "user123"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::resilience::{RetryConfig, ThrottleConfig};

/// API base used when the UI is served from a local machine.
pub const LOCAL_API_BASE: &str = "http://localhost:8000/api/v1";
const API_PATH: &str = "/api/v1";
const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", ""];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Explicit API base; overrides host-based resolution
    pub api_base: Option<String>,
    /// Per-request ceiling; requests are unbounded when unset
    pub request_timeout_secs: Option<u64>,
    pub retry: RetryConfig,
    pub throttle: ThrottleConfig,
    pub content: ContentConfig,
}

/// Settings for chapter content resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Locale whose content needs no translation
    pub default_locale: String,
    /// User whose profile drives personalization
    pub user_id: Option<String>,
    pub personalization_enabled: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            user_id: None,
            personalization_enabled: true,
        }
    }
}

impl ContentConfig {
    /// User to personalize for, if personalization is on.
    pub fn personalization_user(&self) -> Option<&str> {
        if self.personalization_enabled {
            self.user_id.as_deref()
        } else {
            None
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, BridgeError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// API base for a page served from `hostname` at `origin`.
    pub fn api_base_for(&self, hostname: &str, origin: &str) -> String {
        if let Some(base) = &self.api_base {
            return base.clone();
        }
        if LOCAL_HOSTS.contains(&hostname) {
            LOCAL_API_BASE.to_string()
        } else {
            format!("{}{API_PATH}", origin.trim_end_matches('/'))
        }
    }
}

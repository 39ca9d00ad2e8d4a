//! Adapter configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid configuration:
//!
//! ```toml
//! vendor_token = "MOZA"
//! button_identity = "per-index"   # or "shared"
//!
//! [hid]
//! max_reports_per_tick = 32
//! ```

use crate::error::ConfigError;
use crate::event::ButtonIdentity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Product-name token identifying the preferred device.
pub const DEFAULT_VENDOR_TOKEN: &str = "MOZA";

/// Upper bound on HID reports drained in one poll.
pub const DEFAULT_MAX_REPORTS_PER_TICK: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Case-insensitive substring matched against product names during discovery.
    pub vendor_token: String,

    pub button_identity: ButtonIdentity,

    pub hid: HidConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HidConfig {
    /// Prevents one chatty device from stalling the frame.
    pub max_reports_per_tick: usize,
}

impl HidConfig {
    /// Drain bound actually used by the backend: never less than one report.
    #[inline]
    pub fn reports_per_tick(&self) -> usize {
        self.max_reports_per_tick.max(1)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            vendor_token: DEFAULT_VENDOR_TOKEN.to_string(),
            button_identity: ButtonIdentity::default(),
            hid: HidConfig::default(),
        }
    }
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            max_reports_per_tick: DEFAULT_MAX_REPORTS_PER_TICK,
        }
    }
}

impl AdapterConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AdapterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor_token.trim().is_empty() {
            return Err(ConfigError::Invalid("vendor_token must not be empty".into()));
        }
        if self.hid.max_reports_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "hid.max_reports_per_tick must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn with_vendor_token(mut self, token: impl Into<String>) -> Self {
        self.vendor_token = token.into();
        self
    }

    pub fn with_button_identity(mut self, identity: ButtonIdentity) -> Self {
        self.button_identity = identity;
        self
    }
}

//! Dashboard configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```
//! use sysmon_view_core::config::DashboardConfig;
//!
//! let config = DashboardConfig::from_toml_str("auto_refresh_seconds = 30").unwrap();
//! assert_eq!(config.auto_refresh_seconds, 30);
//! assert_eq!(config.slide_ms, 50);
//! ```

use crate::error::ConfigError;
use crate::refresh::DEFAULT_INTERVAL_SECONDS;
use serde::{Deserialize, Serialize};

/// Upper bound for the expand/collapse slide.
pub const MAX_SLIDE_MS: u32 = 5_000;

/// Settings shared by all dashboard pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Start with auto-refresh enabled
    pub auto_refresh: bool,
    /// Auto-refresh interval
    pub auto_refresh_seconds: u32,
    /// Expand/collapse slide duration
    pub slide_ms: u32,
    /// Base path of the REST endpoint
    pub rest_base: String,
    /// Chart appearance
    pub chart: ChartOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            auto_refresh_seconds: DEFAULT_INTERVAL_SECONDS,
            slide_ms: 50,
            rest_base: "rest".to_string(),
            chart: ChartOptions::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auto_refresh_seconds == 0 {
            return Err(ConfigError::InvalidInterval(self.auto_refresh_seconds));
        }
        if self.slide_ms > MAX_SLIDE_MS {
            return Err(ConfigError::InvalidSlide(self.slide_ms));
        }
        Ok(())
    }
}

/// Chart margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    /// Top margin
    pub top: u32,
    /// Right margin
    pub right: u32,
    /// Bottom margin
    pub bottom: u32,
    /// Left margin
    pub left: u32,
}

/// Options handed to the chart library on page start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Plot height
    pub height: u32,
    /// Plot margins
    pub margin: Margins,
    /// Redraw transition
    pub transition_ms: u32,
    /// strftime-style tick format for the time axis
    pub time_format: String,
    /// X axis label
    pub x_label: String,
    /// Y axis label
    pub y_label: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            height: 450,
            margin: Margins {
                top: 20,
                right: 20,
                bottom: 60,
                left: 60,
            },
            transition_ms: 1000,
            time_format: "%m.%d %H:%M:%S".to_string(),
            x_label: "Time".to_string(),
            y_label: "Value".to_string(),
        }
    }
}

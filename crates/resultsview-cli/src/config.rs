//! Results View CLI Configuration
//!
//! Aggregates the router, channel and headless panel settings and loads
//! them from a TOML file. Missing sections and keys keep their defaults.

use std::path::Path;

use anyhow::Context;
use resultsview_core::{ChannelConfig, HeadlessConfig, RouterConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Complete configuration for the bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub channels: ChannelConfig,
    pub headless: HeadlessConfig,
}

impl AppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the router and panel cannot work with
    pub fn validate(&self) -> Result<()> {
        let channels = &self.channels;
        if [
            channels.inbound_buffer_size,
            channels.panel_buffer_size,
            channels.outbound_buffer_size,
            channels.query_buffer_size,
        ]
        .contains(&0)
        {
            return Err(CliError::Config("channel buffer sizes must be non-zero".into()));
        }
        if self.headless.width <= 0.0 {
            return Err(CliError::Config("headless panel width must be positive".into()));
        }
        if self.router.overlay_inset < 0.0 {
            return Err(CliError::Config("overlay inset must not be negative".into()));
        }
        Ok(())
    }
}

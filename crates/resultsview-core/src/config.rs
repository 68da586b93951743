//! Centralized Configuration Management
//!
//! Configuration structures for the router, its channels and the headless
//! panel, each with serde support and named presets.

use core::time::Duration;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes for the router's channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Host → router envelopes
    pub inbound_buffer_size: usize,
    /// Panel → router events
    pub panel_buffer_size: usize,
    /// Router → host envelopes
    pub outbound_buffer_size: usize,
    /// Synchronous queries against router state
    pub query_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            inbound_buffer_size: 32,  // host messages are infrequent
            panel_buffer_size: 256,   // mouse moves are bursty
            outbound_buffer_size: 256,
            query_buffer_size: 16,
        }
    }
}

impl ChannelConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            inbound_buffer_size: 100,
            panel_buffer_size: 100,
            outbound_buffer_size: 100,
            query_buffer_size: 100,
        }
    }
}

// ----------------------------------------------------------------------------
// Router Configuration
// ----------------------------------------------------------------------------

/// What to do with a `getcontent` reply whose results were replaced mid-export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleExportPolicy {
    /// Post the reply anyway (it may describe a node that no longer exists)
    #[default]
    Reply,
    /// Drop the reply
    Drop,
}

/// Configuration for the message router
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Quiet period before a burst of size changes is reported
    #[serde(with = "duration_millis")]
    pub resize_debounce: Duration,
    /// Added to the content width in `sizeChanged`
    pub resize_padding_width: f64,
    /// Added to the content height in `sizeChanged`
    pub resize_padding_height: f64,
    /// Horizontal inset of the selection overlay around non-root nodes
    pub overlay_inset: f64,
    /// Handling of replies that outlived their results
    pub stale_exports: StaleExportPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            resize_debounce: Duration::from_millis(50),
            resize_padding_width: 40.0,
            resize_padding_height: 25.0,
            overlay_inset: 12.0,
            stale_exports: StaleExportPolicy::Reply,
        }
    }
}

// ----------------------------------------------------------------------------
// Headless Panel Configuration
// ----------------------------------------------------------------------------

/// Layout metrics for the headless panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Width of the results root
    pub width: f64,
    /// Height of a titled node's header line
    pub header_height: f64,
    /// Height of a leaf without intrinsic size
    pub row_height: f64,
    /// Horizontal indent of children relative to their parent
    pub indent: f64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            header_height: 30.0,
            row_height: 24.0,
            indent: 20.0,
        }
    }
}

mod duration_millis {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

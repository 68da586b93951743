//! Results View CLI library
//!
//! A line-delimited JSON bridge: host envelopes arrive on stdin, envelopes
//! posted by the router leave on stdout, and the router drives a headless
//! panel in between.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;

pub use app::BridgeApp;
pub use cli::Cli;
pub use config::AppConfig;
pub use error::{CliError, Result};

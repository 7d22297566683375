//! PrintView Settings Crate
//!
//! Handles viewer and parser configuration and its persistence.

pub mod config;
pub mod error;

pub use config::{Config, ParserSettings, ViewerSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};

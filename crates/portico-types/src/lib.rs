//! Core types shared across all Portico crates.
//!
//! Defines the proxy configuration and the process-level error type used by
//! the command engine and the console front end.

pub mod config;
pub mod error;

pub use config::{CommandConfig, PorticoConfig, ServerConfig, CONFIG_FILENAME};
pub use error::PorticoError;

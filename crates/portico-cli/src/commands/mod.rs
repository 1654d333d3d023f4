//! CLI command implementations for the `portico` binary.

pub mod builtins;
pub mod check_config;
pub mod console;

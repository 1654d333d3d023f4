//! `portico check-config PATH`: validate a configuration file.

use std::path::Path;

use anyhow::Result;

use portico_types::{PorticoConfig, PorticoError};

/// Run `portico check-config PATH`.
///
/// A file that parses but fails validation is reported as INVALID; a file
/// that cannot be read is an error.
pub fn run(path: &Path) -> Result<()> {
    match PorticoConfig::load(path) {
        Ok(config) => {
            println!("VALID: {}", describe(&config));
            Ok(())
        }
        Err(PorticoError::ConfigError(reason)) => {
            println!("INVALID: {reason}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn describe(config: &PorticoConfig) -> String {
    let limit = config
        .commands
        .max_suggestions
        .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
    format!(
        "{} server(s), announce_commands = {}, max_suggestions = {}",
        config.servers.len(),
        config.commands.announce_commands,
        limit
    )
}

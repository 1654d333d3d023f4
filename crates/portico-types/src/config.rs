//! Proxy front-end configuration.
//!
//! [`PorticoConfig`] is loaded from `portico.toml`. The `[commands]` table
//! tunes the command engine; `[[servers]]` lists the backends a console
//! operator can switch to.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PorticoError;

/// Conventional configuration file name.
pub const CONFIG_FILENAME: &str = "portico.toml";

/// Config files larger than this are rejected before parsing.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PorticoConfig {
    /// Command engine settings.
    #[serde(default)]
    pub commands: CommandConfig,
    /// Backend servers known to the proxy.
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

/// Settings for command dispatch and suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Whether alias names are offered as completions. When `false`, only
    /// argument-level suggestions are produced.
    #[serde(default = "default_announce_commands")]
    pub announce_commands: bool,
    /// Upper bound on the number of suggestions returned per request.
    #[serde(default)]
    pub max_suggestions: Option<usize>,
}

fn default_announce_commands() -> bool {
    true
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            announce_commands: true,
            max_suggestions: None,
        }
    }
}

/// A backend server entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name operators use to refer to the server (e.g. `lobby`).
    pub name: String,
    /// `host:port` of the backend.
    pub address: String,
}

impl PorticoConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, PorticoError> {
        let config: Self =
            toml::from_str(content).map_err(|e| PorticoError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, PorticoError> {
        toml::to_string_pretty(self).map_err(|e| PorticoError::ConfigError(e.to_string()))
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, PorticoError> {
        let io_err = |source| PorticoError::Io {
            path: path.display().to_string(),
            source,
        };
        let metadata = std::fs::metadata(path).map_err(io_err)?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PorticoError::ConfigError(format!(
                "{} is {} bytes, larger than the {MAX_CONFIG_FILE_SIZE} byte limit",
                path.display(),
                metadata.len()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(io_err)?;
        Self::from_toml(&content)
    }

    /// Look up a server by name (case-insensitive).
    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn validate(&self) -> Result<(), PorticoError> {
        if self.commands.max_suggestions == Some(0) {
            return Err(PorticoError::ConfigError(
                "commands.max_suggestions must be at least 1 (omit it for no limit)".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if server.name.is_empty() || server.name.chars().any(char::is_whitespace) {
                return Err(PorticoError::ConfigError(format!(
                    "invalid server name: {:?}",
                    server.name
                )));
            }
            if !seen.insert(server.name.to_lowercase()) {
                return Err(PorticoError::ConfigError(format!(
                    "duplicate server name: {}",
                    server.name
                )));
            }
        }
        Ok(())
    }
}

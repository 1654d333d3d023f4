//! Error types shared across all Portico crates.

/// Errors that can occur outside a single command dispatch.
///
/// Per-dispatch failures live in `portico-command`; these cover the
/// process-level concerns: configuration and I/O around it.
#[derive(Debug, thiserror::Error)]
pub enum PorticoError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

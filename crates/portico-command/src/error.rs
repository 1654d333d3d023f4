//! Error types for command registration, dispatch, and suggestions.
//!
//! Dispatch failures are layered on purpose:
//!
//! - a failing permission predicate or command body is wrapped once in a
//!   [`CommandError`];
//! - awaiting a [`DispatchHandle`](crate::DispatchHandle) adds the join layer,
//!   [`CompletionError`], around that;
//! - suggestion failures are only ever wrapped by the join layer,
//!   [`SuggestionError`].

use tokio::task::JoinError;

/// A failure attributable to one dispatched command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The permission predicate raised instead of answering.
    #[error("failed to check permission for command '{alias}'")]
    PermissionCheckFailed {
        alias: String,
        source: anyhow::Error,
    },

    /// The command body returned an error.
    #[error("command execution failed for '{alias}'")]
    ExecutionFailed {
        alias: String,
        source: anyhow::Error,
    },

    /// The task running the command body panicked or was aborted.
    #[error("command task for '{alias}' did not complete")]
    Aborted {
        alias: String,
        #[source]
        source: JoinError,
    },
}

impl CommandError {
    /// The alias the failing dispatch resolved to.
    pub fn alias(&self) -> &str {
        match self {
            CommandError::PermissionCheckFailed { alias, .. }
            | CommandError::ExecutionFailed { alias, .. }
            | CommandError::Aborted { alias, .. } => alias,
        }
    }
}

/// Error observed when joining an in-flight dispatch.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("dispatch completed exceptionally")]
    Failed(#[source] CommandError),

    #[error("dispatch task did not complete")]
    Aborted(#[source] JoinError),
}

/// Error observed when joining a suggestion request.
#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("suggestion request completed exceptionally")]
    Failed(#[source] anyhow::Error),

    #[error("suggestion task did not complete")]
    Aborted(#[source] JoinError),
}

/// Rejected command registrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("command alias must not be empty")]
    EmptyAlias,

    #[error("command alias must not contain whitespace: {alias:?}")]
    InvalidAlias { alias: String },

    #[error("grammar root '{name}' must be a literal node")]
    RootNotLiteral { name: String },

    #[error("grammar root '{root}' does not match primary alias '{primary}'")]
    RootMismatch { root: String, primary: String },
}

//! The execute path: resolve the alias, check permission, run the body.
//!
//! Resolution and the permission check happen on the caller's thread so a
//! raising predicate surfaces from the dispatch call itself. The command
//! body runs on a spawned task and settles a [`DispatchHandle`].

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::command::{
    raw_arguments, simple_arguments, Command, GrammarInvocation, InvocableCommand, Invocation,
};
use crate::error::{CommandError, CompletionError};
use crate::parse::{parse, SyntaxError};
use crate::source::CommandSource;
use crate::table::CommandTable;

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A command accepted the input and its body completed.
    Handled,
    /// Not a known, permitted command for this source: pass the line on
    /// to the backend unchanged.
    Forwarded,
    /// A grammar command rejected the input as malformed.
    Invalid(SyntaxError),
}

/// An in-flight or already settled dispatch.
#[derive(Debug)]
pub struct DispatchHandle {
    alias: Option<String>,
    state: HandleState,
}

#[derive(Debug)]
enum HandleState {
    Settled(DispatchOutcome),
    Running(JoinHandle<Result<(), CommandError>>),
}

impl DispatchHandle {
    fn settled(alias: Option<String>, outcome: DispatchOutcome) -> Self {
        Self {
            alias,
            state: HandleState::Settled(outcome),
        }
    }

    fn spawn<F>(alias: String, body: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let task_alias = alias.clone();
        let task = tokio::spawn(async move {
            body.await.map_err(|source| {
                warn!(alias = %task_alias, error = %source, "command execution failed");
                CommandError::ExecutionFailed {
                    alias: task_alias,
                    source,
                }
            })
        });
        Self {
            alias: Some(alias),
            state: HandleState::Running(task),
        }
    }

    /// The case-folded alias the input resolved to, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Whether the line should go to the backend. Known without awaiting.
    pub fn is_forwarded(&self) -> bool {
        matches!(self.state, HandleState::Settled(DispatchOutcome::Forwarded))
    }

    /// Whether [`join`](Self::join) would resolve without waiting.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            HandleState::Settled(_) => true,
            HandleState::Running(task) => task.is_finished(),
        }
    }

    /// Wait for the dispatch to settle.
    ///
    /// A failing command body surfaces as [`CompletionError::Failed`]
    /// wrapping the [`CommandError::ExecutionFailed`] that wraps the body's
    /// own error.
    pub async fn join(self) -> Result<DispatchOutcome, CompletionError> {
        match self.state {
            HandleState::Settled(outcome) => Ok(outcome),
            HandleState::Running(task) => match task.await {
                Ok(Ok(())) => Ok(DispatchOutcome::Handled),
                Ok(Err(error)) => Err(CompletionError::Failed(error)),
                Err(join_error) => Err(CompletionError::Aborted(join_error)),
            },
        }
    }
}

/// Split a line into its alias token and the remainder, both trimmed at
/// the front. `None` for blank input.
pub(crate) fn split_alias(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    Some((&trimmed[..end], trimmed[end..].trim_start()))
}

/// Dispatch `line` against one table snapshot.
pub(crate) fn dispatch(
    table: &CommandTable,
    source: Arc<dyn CommandSource>,
    line: &str,
) -> Result<DispatchHandle, CommandError> {
    let Some((token, remainder)) = split_alias(line) else {
        return Ok(DispatchHandle::settled(None, DispatchOutcome::Forwarded));
    };
    let alias = token.to_lowercase();
    let Some(entry) = table.resolve(&alias) else {
        debug!(alias = %alias, source = source.name(), "unknown alias, forwarding");
        return Ok(DispatchHandle::settled(Some(alias), DispatchOutcome::Forwarded));
    };

    match &entry.registration.command {
        Command::Simple(command) => dispatch_invocable(
            command,
            Invocation::new(source, alias, simple_arguments(remainder)),
        ),
        Command::Raw(command) => dispatch_invocable(
            command,
            Invocation::new(source, alias, raw_arguments(remainder)),
        ),
        Command::Grammar(_) => dispatch_grammar(GrammarInvocation::new(
            source,
            alias,
            parse(&entry.node, remainder),
        )),
    }
}

fn dispatch_invocable<A: Send + Sync + 'static>(
    command: &Arc<dyn InvocableCommand<A>>,
    invocation: Invocation<A>,
) -> Result<DispatchHandle, CommandError> {
    let alias = invocation.alias().to_string();
    let permitted = command
        .has_permission(&invocation)
        .map_err(|source| permission_failed(&alias, source))?;
    if !permitted {
        debug!(alias = %alias, source = invocation.source().name(), "permission denied, forwarding");
        return Ok(DispatchHandle::settled(Some(alias), DispatchOutcome::Forwarded));
    }

    let command = Arc::clone(command);
    Ok(DispatchHandle::spawn(alias, async move {
        command.execute(&invocation).await
    }))
}

fn dispatch_grammar(invocation: GrammarInvocation) -> Result<DispatchHandle, CommandError> {
    let alias = invocation.alias().to_string();
    let permitted = invocation
        .has_permission()
        .map_err(|source| permission_failed(&alias, source))?;
    if !permitted {
        debug!(alias = %alias, source = invocation.source().name(), "permission denied, forwarding");
        return Ok(DispatchHandle::settled(Some(alias), DispatchOutcome::Forwarded));
    }

    match invocation.parse().executor() {
        Ok(executor) => {
            let context = invocation.context();
            Ok(DispatchHandle::spawn(alias, async move {
                executor.run(context).await
            }))
        }
        Err(error) => {
            debug!(alias = %alias, error = %error, "rejecting malformed input");
            Ok(DispatchHandle::settled(
                Some(alias),
                DispatchOutcome::Invalid(error),
            ))
        }
    }
}

fn permission_failed(alias: &str, source: anyhow::Error) -> CommandError {
    warn!(alias = %alias, error = %source, "permission check raised");
    CommandError::PermissionCheckFailed {
        alias: alias.to_string(),
        source,
    }
}

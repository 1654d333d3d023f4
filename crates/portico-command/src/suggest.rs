//! The suggestion path.
//!
//! With no whitespace after the alias token, the candidates are aliases the
//! source may use. Past the alias, the candidates come from the alias's
//! grammar subtree and, for simple and raw commands, from the command's own
//! [`suggest`](crate::InvocableCommand::suggest).

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use portico_types::CommandConfig;

use crate::command::{raw_arguments, simple_arguments, Command, InvocableCommand, Invocation};
use crate::error::SuggestionError;
use crate::node::{GrammarNode, SuggestionContext};
use crate::parse::completion_point;
use crate::source::CommandSource;
use crate::table::{AliasEntry, CommandTable};

/// A pending list of completions.
#[derive(Debug)]
pub struct SuggestionHandle {
    task: JoinHandle<Result<Vec<String>>>,
}

impl SuggestionHandle {
    pub(crate) fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = Result<Vec<String>>> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let result = work.await;
            if let Err(error) = &result {
                warn!(error = %error, "suggestion lookup failed");
            }
            result
        });
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the completions. A raising predicate or provider surfaces
    /// as [`SuggestionError::Failed`] around the original error.
    pub async fn join(self) -> Result<Vec<String>, SuggestionError> {
        match self.task.await {
            Ok(Ok(suggestions)) => Ok(suggestions),
            Ok(Err(error)) => Err(SuggestionError::Failed(error)),
            Err(join_error) => Err(SuggestionError::Aborted(join_error)),
        }
    }
}

/// Compute completions for `line` against one table snapshot.
pub(crate) async fn suggestions(
    table: Arc<CommandTable>,
    config: CommandConfig,
    source: Arc<dyn CommandSource>,
    line: String,
) -> Result<Vec<String>> {
    let trimmed = line.trim_start();
    let mut suggestions = match trimmed.find(char::is_whitespace) {
        None if config.announce_commands => alias_suggestions(&table, &source, trimmed)?,
        None => Vec::new(),
        Some(end) => {
            let alias = trimmed[..end].to_lowercase();
            let remainder = trimmed[end..].trim_start();
            match table.resolve(&alias) {
                Some(entry) => argument_suggestions(entry, &source, alias, remainder).await?,
                None => Vec::new(),
            }
        }
    };

    if let Some(max) = config.max_suggestions {
        suggestions.truncate(max);
    }
    Ok(suggestions)
}

/// Aliases extending `typed` that the source may use. An alias typed in
/// full is not offered back.
fn alias_suggestions(
    table: &CommandTable,
    source: &Arc<dyn CommandSource>,
    typed: &str,
) -> Result<Vec<String>> {
    let prefix = typed.to_lowercase();
    let mut found = Vec::new();
    for (alias, entry) in table.with_prefix(&prefix) {
        if alias == prefix {
            continue;
        }
        if entry.permits_alias(alias, source)? {
            found.push(alias.to_string());
        }
    }
    Ok(found)
}

async fn argument_suggestions(
    entry: &AliasEntry,
    source: &Arc<dyn CommandSource>,
    alias: String,
    remainder: &str,
) -> Result<Vec<String>> {
    match &entry.registration.command {
        Command::Simple(command) => {
            let invocation = Invocation::new(Arc::clone(source), alias, simple_arguments(remainder));
            invocable_suggestions(command, invocation, &entry.node, source, remainder).await
        }
        Command::Raw(command) => {
            let invocation = Invocation::new(Arc::clone(source), alias, raw_arguments(remainder));
            invocable_suggestions(command, invocation, &entry.node, source, remainder).await
        }
        Command::Grammar(_) => {
            let found = grammar_suggestions(&entry.node, source, &alias, remainder).await?;
            let mut seen = HashSet::new();
            Ok(found
                .into_iter()
                .filter(|suggestion| seen.insert(suggestion.clone()))
                .collect())
        }
    }
}

/// Hint-tree completions merged with the command's own, sorted and
/// deduplicated. Nothing at all if the command refuses the source.
async fn invocable_suggestions<A: Send + Sync + 'static>(
    command: &Arc<dyn InvocableCommand<A>>,
    invocation: Invocation<A>,
    node: &Arc<GrammarNode>,
    source: &Arc<dyn CommandSource>,
    remainder: &str,
) -> Result<Vec<String>> {
    if !command.has_permission(&invocation)? {
        debug!(alias = invocation.alias(), source = source.name(), "suggestions withheld");
        return Ok(Vec::new());
    }

    let mut merged: BTreeSet<String> = grammar_suggestions(node, source, invocation.alias(), remainder)
        .await?
        .into_iter()
        .collect();
    merged.extend(command.suggest(&invocation).await?);
    Ok(merged.into_iter().collect())
}

/// Completions offered by the grammar subtree at `root` for `remainder`.
async fn grammar_suggestions(
    root: &Arc<GrammarNode>,
    source: &Arc<dyn CommandSource>,
    alias: &str,
    remainder: &str,
) -> Result<Vec<String>> {
    let Some(point) = completion_point(root, remainder) else {
        return Ok(Vec::new());
    };
    for node in &point.path {
        if !node.permits(source.as_ref())? {
            return Ok(Vec::new());
        }
    }
    let Some(parent) = point.parent() else {
        return Ok(Vec::new());
    };

    let partial = point.partial.to_lowercase();
    let mut found = Vec::new();
    for child in parent.children() {
        if !child.can_use(source.as_ref())? {
            continue;
        }
        if child.is_literal() {
            if child.name().to_lowercase().starts_with(&partial) {
                found.push(child.name().to_string());
            }
        } else if let Some(provider) = child.suggester() {
            let context = SuggestionContext {
                source: Arc::clone(source),
                alias: alias.to_string(),
                arguments: point.arguments.clone(),
                partial: point.partial.clone(),
            };
            found.extend(provider.suggest(context).await?);
        }
    }
    Ok(found)
}

//! The command manager: registration, dispatch, and suggestions.
//!
//! Registrations are published as immutable [`CommandTable`] snapshots.
//! Readers load the current snapshot without locking; writers serialize on a
//! mutex, copy the snapshot, apply their change, and store the copy. A
//! dispatch or suggestion request works against the snapshot it loaded at
//! its start, so a concurrent registration is either fully visible to it or
//! not at all.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::{debug, info};

use portico_types::CommandConfig;

use crate::command::{Command, CommandMeta, CommandRegistration};
use crate::dispatch::{self, DispatchHandle, DispatchOutcome};
use crate::error::{CommandError, CompletionError, RegistrationError, SuggestionError};
use crate::source::CommandSource;
use crate::suggest::{self, SuggestionHandle};
use crate::table::CommandTable;

/// Owns the alias table and routes command lines to commands.
///
/// Dispatch and suggestion spawn onto the ambient Tokio runtime.
pub struct CommandManager {
    table: ArcSwap<CommandTable>,
    write_lock: Mutex<()>,
    config: CommandConfig,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandManager {
    pub fn new() -> Self {
        Self::with_config(CommandConfig::default())
    }

    pub fn with_config(config: CommandConfig) -> Self {
        Self {
            table: ArcSwap::from_pointee(CommandTable::default()),
            write_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Register `command` under every alias in `meta`.
    ///
    /// An alias that is already registered is replaced along with its whole
    /// subtree. Other aliases of the previous registration are untouched.
    pub fn register(&self, meta: CommandMeta, command: Command) -> Result<(), RegistrationError> {
        meta.validate(&command)?;

        let primary = meta.primary_alias().to_string();
        let kind = command.kind_name();
        let alias_count = meta.aliases().count();
        let registration = Arc::new(CommandRegistration { meta, command });

        let replaced = self.update(|table| table.insert(registration));
        for alias in &replaced {
            debug!(alias = %alias, "replaced existing registration");
        }
        info!(alias = %primary, kind, aliases = alias_count, "registered command");
        Ok(())
    }

    /// Remove one alias. Returns whether it was registered.
    pub fn unregister(&self, alias: &str) -> bool {
        let alias = alias.to_lowercase();
        let removed = self.update(|table| table.remove(&alias));
        if removed {
            info!(alias = %alias, "unregistered command alias");
        }
        removed
    }

    /// Whether `alias` is registered, regardless of permission.
    pub fn has_command(&self, alias: &str) -> bool {
        self.table.load().resolve(&alias.to_lowercase()).is_some()
    }

    /// Whether `alias` is registered and `source` may use it.
    pub fn has_command_for(
        &self,
        alias: &str,
        source: &Arc<dyn CommandSource>,
    ) -> Result<bool, CommandError> {
        let alias = alias.to_lowercase();
        let table = self.table.load();
        let Some(entry) = table.resolve(&alias) else {
            return Ok(false);
        };
        entry
            .permits_alias(&alias, source)
            .map_err(|source| CommandError::PermissionCheckFailed { alias, source })
    }

    /// Every registered alias, sorted.
    pub fn aliases(&self) -> Vec<String> {
        self.table.load().aliases()
    }

    /// The meta `alias` was registered with.
    pub fn command_meta(&self, alias: &str) -> Option<CommandMeta> {
        self.table
            .load()
            .resolve(&alias.to_lowercase())
            .map(|entry| entry.registration.meta.clone())
    }

    /// Start dispatching `line` on behalf of `source`.
    ///
    /// Resolution and permission checks happen before this returns, so
    /// [`DispatchHandle::is_forwarded`] is known immediately and a raising
    /// permission predicate is returned here as
    /// [`CommandError::PermissionCheckFailed`]. The command body runs on a
    /// spawned task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime and the line resolves to a
    /// command body that must be spawned.
    pub fn execute_async(
        &self,
        source: Arc<dyn CommandSource>,
        line: &str,
    ) -> Result<DispatchHandle, CommandError> {
        let snapshot = self.table.load_full();
        dispatch::dispatch(&snapshot, source, line)
    }

    /// Dispatch `line` and wait for it to settle.
    pub async fn execute(
        &self,
        source: Arc<dyn CommandSource>,
        line: &str,
    ) -> Result<DispatchOutcome, CommandError> {
        let handle = self.execute_async(source, line)?;
        let alias = handle.alias().unwrap_or_default().to_string();
        match handle.join().await {
            Ok(outcome) => Ok(outcome),
            Err(CompletionError::Failed(error)) => Err(error),
            Err(CompletionError::Aborted(source)) => Err(CommandError::Aborted { alias, source }),
        }
    }

    /// Start computing completions for a partially typed `line`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn offer_suggestions(&self, source: Arc<dyn CommandSource>, line: &str) -> SuggestionHandle {
        let snapshot = self.table.load_full();
        SuggestionHandle::spawn(suggest::suggestions(
            snapshot,
            self.config.clone(),
            source,
            line.to_string(),
        ))
    }

    /// Completions for `line`, awaited.
    pub async fn suggest(
        &self,
        source: Arc<dyn CommandSource>,
        line: &str,
    ) -> Result<Vec<String>, SuggestionError> {
        self.offer_suggestions(source, line).join().await
    }

    /// Apply `change` to a copy of the current table and publish it.
    fn update<R>(&self, change: impl FnOnce(&mut CommandTable) -> R) -> R {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = CommandTable::clone(&self.table.load_full());
        let result = change(&mut next);
        self.table.store(Arc::new(next));
        result
    }
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("aliases", &self.table.load().len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{InvocableCommand, RawInvocation, SimpleInvocation};
    use crate::node::{ArgumentKind, CommandContext, GrammarNode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Console;

    impl CommandSource for Console {
        fn name(&self) -> &str {
            "console"
        }

        fn has_permission(&self, _permission: &str) -> bool {
            true
        }
    }

    fn console() -> Arc<dyn CommandSource> {
        Arc::new(Console)
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl InvocableCommand<Vec<String>> for Arc<Counting> {
        async fn execute(&self, _invocation: &SimpleInvocation) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Denied;

    #[async_trait::async_trait]
    impl InvocableCommand<String> for Denied {
        async fn execute(&self, _invocation: &RawInvocation) -> anyhow::Result<()> {
            anyhow::bail!("must not run")
        }

        fn has_permission(&self, _invocation: &RawInvocation) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn dispatch_is_case_insensitive() {
        let manager = CommandManager::new();
        let counting = Arc::new(Counting::default());
        manager
            .register(CommandMeta::builder("Hello").build(), Command::simple(Arc::clone(&counting)))
            .unwrap();

        assert!(manager.has_command("HELLO"));
        let outcome = manager.execute(console(), "hElLo").await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_and_denied_are_forwarded() {
        let manager = CommandManager::new();
        manager
            .register(CommandMeta::builder("secret").build(), Command::raw(Denied))
            .unwrap();

        assert!(manager.execute_async(console(), "nope").unwrap().is_forwarded());
        assert!(manager.execute_async(console(), "secret arg").unwrap().is_forwarded());
        assert!(!manager.has_command_for("secret", &console()).unwrap());
        assert!(manager.has_command("secret"));
    }

    #[tokio::test]
    async fn unregister_removes_single_alias() {
        let manager = CommandManager::new();
        let counting = Arc::new(Counting::default());
        manager
            .register(
                CommandMeta::builder("foo").alias("bar").build(),
                Command::simple(counting),
            )
            .unwrap();

        assert!(manager.unregister("FOO"));
        assert!(!manager.unregister("foo"));
        assert_eq!(manager.aliases(), vec!["bar"]);
        assert_eq!(manager.command_meta("bar").unwrap().primary_alias(), "foo");
    }

    #[tokio::test]
    async fn invalid_registration_leaves_table_untouched() {
        let manager = CommandManager::new();
        let err = manager
            .register(
                CommandMeta::builder("other").build(),
                Command::grammar(GrammarNode::literal("server")),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::RootMismatch { .. }));
        assert!(manager.aliases().is_empty());
    }

    #[tokio::test]
    async fn grammar_outcomes() {
        let manager = CommandManager::new();
        let root = GrammarNode::literal("add").then(
            GrammarNode::argument("n", ArgumentKind::integer())
                .executes(|_ctx: CommandContext| async { Ok::<_, anyhow::Error>(()) }),
        );
        manager
            .register(CommandMeta::for_grammar(&root).build(), Command::grammar(root))
            .unwrap();

        assert_eq!(
            manager.execute(console(), "add 3").await.unwrap(),
            DispatchOutcome::Handled
        );
        assert!(matches!(
            manager.execute(console(), "add three").await.unwrap(),
            DispatchOutcome::Invalid(_)
        ));
        assert!(matches!(
            manager.execute(console(), "add").await.unwrap(),
            DispatchOutcome::Invalid(_)
        ));
    }

    #[tokio::test]
    async fn execute_unwraps_the_join_layer() {
        let manager = CommandManager::new();
        let root = GrammarNode::literal("fail")
            .executes(|_ctx: CommandContext| async { Err::<(), _>(anyhow::anyhow!("nope")) });
        manager
            .register(CommandMeta::for_grammar(&root).build(), Command::grammar(root))
            .unwrap();

        let err = manager.execute(console(), "fail").await.unwrap_err();
        assert!(matches!(err, CommandError::ExecutionFailed { .. }));
        assert_eq!(err.alias(), "fail");
    }
}

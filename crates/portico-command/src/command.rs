//! Command kinds, invocations, and registration metadata.
//!
//! Provides:
//! - [`InvocableCommand`] -- the trait behind simple and raw commands
//! - [`Invocation`] / [`SimpleInvocation`] / [`RawInvocation`] / [`GrammarInvocation`]
//! - [`Command`] -- the closed set of command kinds the manager accepts
//! - [`CommandMeta`] -- aliases and grammar hints for a registration

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::RegistrationError;
use crate::node::{CommandContext, GrammarNode, NodeKind};
use crate::parse::ParseResults;
use crate::source::CommandSource;

/// A request to run a command: who asked, which alias they typed, and the
/// arguments in the command kind's representation.
pub struct Invocation<A> {
    source: Arc<dyn CommandSource>,
    alias: String,
    arguments: A,
}

/// Arguments split on whitespace.
pub type SimpleInvocation = Invocation<Vec<String>>;

/// Arguments as one trimmed string.
pub type RawInvocation = Invocation<String>;

impl<A> Invocation<A> {
    pub(crate) fn new(source: Arc<dyn CommandSource>, alias: String, arguments: A) -> Self {
        Self {
            source,
            alias,
            arguments,
        }
    }

    pub fn source(&self) -> &dyn CommandSource {
        self.source.as_ref()
    }

    /// The alias as typed, case-folded.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn arguments(&self) -> &A {
        &self.arguments
    }
}

impl<A: fmt::Debug> fmt::Debug for Invocation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("source", &self.source.name())
            .field("alias", &self.alias)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Split the text after the alias into simple-command arguments.
pub(crate) fn simple_arguments(remainder: &str) -> Vec<String> {
    remainder.split_whitespace().map(str::to_string).collect()
}

/// The text after the alias as a raw-command argument string.
pub(crate) fn raw_arguments(remainder: &str) -> String {
    remainder.trim().to_string()
}

/// A command whose body receives a pre-split or raw argument payload.
///
/// Implement `InvocableCommand<Vec<String>>` for a simple command or
/// `InvocableCommand<String>` for a raw one.
#[async_trait]
pub trait InvocableCommand<A: Send + Sync + 'static>: Send + Sync {
    /// Run the command.
    async fn execute(&self, invocation: &Invocation<A>) -> Result<()>;

    /// Completions for the argument position reached by `invocation`.
    async fn suggest(&self, _invocation: &Invocation<A>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Whether the invocation's source may run this command. Returning
    /// `false` makes the command invisible: the input is forwarded.
    fn has_permission(&self, _invocation: &Invocation<A>) -> Result<bool> {
        Ok(true)
    }
}

/// A grammar command invocation: the parse of the text after the alias.
pub struct GrammarInvocation {
    source: Arc<dyn CommandSource>,
    alias: String,
    parse: ParseResults,
}

impl GrammarInvocation {
    pub(crate) fn new(source: Arc<dyn CommandSource>, alias: String, parse: ParseResults) -> Self {
        Self {
            source,
            alias,
            parse,
        }
    }

    pub fn source(&self) -> &dyn CommandSource {
        self.source.as_ref()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn parse(&self) -> &ParseResults {
        &self.parse
    }

    /// Every grammar node consumed by the parse permits the source.
    pub fn has_permission(&self) -> Result<bool> {
        self.parse.permits(self.source.as_ref())
    }

    pub(crate) fn context(&self) -> CommandContext {
        CommandContext {
            source: Arc::clone(&self.source),
            alias: self.alias.clone(),
            input: self.parse.input().to_string(),
            arguments: self.parse.arguments().clone(),
        }
    }
}

/// The kinds of command the manager can dispatch.
#[derive(Clone)]
pub enum Command {
    /// Arguments split on whitespace runs.
    Simple(Arc<dyn InvocableCommand<Vec<String>>>),
    /// Arguments passed through as one trimmed string.
    Raw(Arc<dyn InvocableCommand<String>>),
    /// Parsed and executed through a grammar tree rooted at this literal.
    Grammar(Arc<GrammarNode>),
}

impl Command {
    pub fn simple(command: impl InvocableCommand<Vec<String>> + 'static) -> Self {
        Command::Simple(Arc::new(command))
    }

    pub fn raw(command: impl InvocableCommand<String> + 'static) -> Self {
        Command::Raw(Arc::new(command))
    }

    pub fn grammar(root: GrammarNode) -> Self {
        Command::Grammar(Arc::new(root))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Command::Simple(_) => "simple",
            Command::Raw(_) => "raw",
            Command::Grammar(_) => "grammar",
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Grammar(root) => f.debug_tuple("Grammar").field(&root.name()).finish(),
            other => f.write_str(other.kind_name()),
        }
    }
}

/// Aliases and grammar hints describing a registration.
///
/// Aliases are case-folded when the meta is built.
#[derive(Debug, Clone)]
pub struct CommandMeta {
    primary_alias: String,
    secondary_aliases: BTreeSet<String>,
    hints: Vec<GrammarNode>,
}

impl CommandMeta {
    /// Start building meta for `primary_alias`.
    pub fn builder(primary_alias: impl Into<String>) -> CommandMetaBuilder {
        CommandMetaBuilder {
            primary_alias: primary_alias.into(),
            aliases: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Meta for a grammar command, using the root's name as primary alias.
    pub fn for_grammar(root: &GrammarNode) -> CommandMetaBuilder {
        Self::builder(root.name())
    }

    pub fn primary_alias(&self) -> &str {
        &self.primary_alias
    }

    pub fn secondary_aliases(&self) -> &BTreeSet<String> {
        &self.secondary_aliases
    }

    /// Primary alias first, then secondaries in order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_alias.as_str())
            .chain(self.secondary_aliases.iter().map(String::as_str))
    }

    pub fn hints(&self) -> &[GrammarNode] {
        &self.hints
    }

    pub(crate) fn validate(&self, command: &Command) -> Result<(), RegistrationError> {
        for alias in self.aliases() {
            if alias.is_empty() {
                return Err(RegistrationError::EmptyAlias);
            }
            if alias.chars().any(char::is_whitespace) {
                return Err(RegistrationError::InvalidAlias {
                    alias: alias.to_string(),
                });
            }
        }
        if let Command::Grammar(root) = command {
            if !matches!(root.kind(), NodeKind::Literal) {
                return Err(RegistrationError::RootNotLiteral {
                    name: root.name().to_string(),
                });
            }
            if root.name().to_lowercase() != self.primary_alias {
                return Err(RegistrationError::RootMismatch {
                    root: root.name().to_string(),
                    primary: self.primary_alias.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`CommandMeta`].
#[derive(Debug)]
pub struct CommandMetaBuilder {
    primary_alias: String,
    aliases: Vec<String>,
    hints: Vec<GrammarNode>,
}

impl CommandMetaBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Describe argument structure for completion. Ignored by grammar
    /// commands, which carry their own tree.
    pub fn hint(mut self, node: GrammarNode) -> Self {
        self.hints.push(node);
        self
    }

    pub fn build(self) -> CommandMeta {
        let primary_alias = self.primary_alias.to_lowercase();
        let secondary_aliases = self
            .aliases
            .into_iter()
            .map(|a| a.to_lowercase())
            .filter(|a| *a != primary_alias)
            .collect();
        CommandMeta {
            primary_alias,
            secondary_aliases,
            hints: self.hints,
        }
    }
}

/// A command together with the meta it was registered under.
#[derive(Debug)]
pub(crate) struct CommandRegistration {
    pub meta: CommandMeta,
    pub command: Command,
}

//! The alias table: one snapshot of every registered alias.
//!
//! A [`CommandTable`] is never mutated while shared. The manager clones it,
//! applies a registration change, and publishes the result as the next
//! snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::command::{Command, CommandRegistration, Invocation};
use crate::node::GrammarNode;
use crate::source::CommandSource;
use crate::tree::alias_nodes;

/// What one alias resolves to.
#[derive(Debug, Clone)]
pub(crate) struct AliasEntry {
    pub registration: Arc<CommandRegistration>,
    /// Root of this alias's grammar subtree.
    pub node: Arc<GrammarNode>,
}

impl AliasEntry {
    /// Permission check with the alias alone and no arguments.
    pub fn permits_alias(&self, alias: &str, source: &Arc<dyn CommandSource>) -> Result<bool> {
        match &self.registration.command {
            Command::Simple(command) => command.has_permission(&Invocation::new(
                Arc::clone(source),
                alias.to_string(),
                Vec::new(),
            )),
            Command::Raw(command) => command.has_permission(&Invocation::new(
                Arc::clone(source),
                alias.to_string(),
                String::new(),
            )),
            Command::Grammar(_) => self.node.permits(source.as_ref()),
        }
    }
}

/// Case-folded alias -> entry.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandTable {
    entries: HashMap<String, AliasEntry>,
}

impl CommandTable {
    /// Look up a case-folded alias.
    pub fn resolve(&self, alias: &str) -> Option<&AliasEntry> {
        self.entries.get(alias)
    }

    /// Insert an entry for every alias of `registration`, replacing whatever
    /// those aliases mapped to before. Returns the aliases that were replaced.
    pub fn insert(&mut self, registration: Arc<CommandRegistration>) -> Vec<String> {
        let mut replaced = Vec::new();
        for (alias, node) in alias_nodes(&registration.meta, &registration.command) {
            let entry = AliasEntry {
                registration: Arc::clone(&registration),
                node,
            };
            if self.entries.insert(alias.clone(), entry).is_some() {
                replaced.push(alias);
            }
        }
        replaced
    }

    /// Remove one alias and its subtree.
    pub fn remove(&mut self, alias: &str) -> bool {
        self.entries.remove(alias).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.entries.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Entries whose alias starts with `prefix`, sorted by alias.
    pub fn with_prefix<'a>(&'a self, prefix: &str) -> Vec<(&'a str, &'a AliasEntry)> {
        let mut matches: Vec<(&str, &AliasEntry)> = self
            .entries
            .iter()
            .filter(|(alias, _)| alias.starts_with(prefix))
            .map(|(alias, entry)| (alias.as_str(), entry))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches
    }
}

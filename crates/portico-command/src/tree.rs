//! Building the grammar subtree that sits under each alias.
//!
//! Simple and raw commands get a fresh literal per alias with a deep copy of
//! every hint grafted beneath it, so each alias owns an independent subtree.
//! Grammar commands keep one root: the primary alias maps to it and every
//! secondary alias becomes a redirect onto it.

use std::sync::Arc;

use tracing::debug;

use crate::command::{Command, CommandMeta};
use crate::node::GrammarNode;

/// The node each alias of a registration resolves to.
pub(crate) fn alias_nodes(meta: &CommandMeta, command: &Command) -> Vec<(String, Arc<GrammarNode>)> {
    match command {
        Command::Grammar(root) => {
            if !meta.hints().is_empty() {
                debug!(
                    alias = meta.primary_alias(),
                    hints = meta.hints().len(),
                    "ignoring hints on grammar command"
                );
            }
            let mut nodes = vec![(meta.primary_alias().to_string(), Arc::clone(root))];
            for alias in meta.secondary_aliases() {
                nodes.push((
                    alias.clone(),
                    Arc::new(GrammarNode::redirect(alias.clone(), Arc::clone(root))),
                ));
            }
            nodes
        }
        Command::Simple(_) | Command::Raw(_) => meta
            .aliases()
            .map(|alias| (alias.to_string(), Arc::new(hinted_literal(alias, meta.hints()))))
            .collect(),
    }
}

fn hinted_literal(alias: &str, hints: &[GrammarNode]) -> GrammarNode {
    let mut node = GrammarNode::literal(alias);
    for hint in hints {
        node.add_child(hint.deep_copy());
    }
    node
}

//! Parsing command input against a grammar subtree.
//!
//! [`parse`] walks the children of an alias node token by token. Literal
//! children win over argument children when the token names them; among
//! the remaining candidates the first complete parse is taken, otherwise the
//! deepest partial parse is reported with its [`SyntaxError`].

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use anyhow::Result;

use crate::node::{ArgumentKind, ArgumentValue, GrammarExecutor, GrammarNode, NodeKind};
use crate::source::CommandSource;

/// Malformed grammar input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {cursor}")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the input following the alias.
    pub cursor: usize,
}

impl SyntaxError {
    fn new(message: impl Into<String>, cursor: usize) -> Self {
        Self {
            message: message.into(),
            cursor,
        }
    }
}

/// A node consumed by a parse and the input range it matched.
#[derive(Debug, Clone)]
pub struct ParsedNode {
    pub node: Arc<GrammarNode>,
    pub range: Range<usize>,
}

/// Outcome of parsing the input that follows an alias.
#[derive(Debug, Clone)]
pub struct ParseResults {
    input: String,
    nodes: Vec<ParsedNode>,
    arguments: BTreeMap<String, ArgumentValue>,
    cursor: usize,
    error: Option<SyntaxError>,
}

impl ParseResults {
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Nodes traversed, starting with the alias node.
    pub fn nodes(&self) -> &[ParsedNode] {
        &self.nodes
    }

    pub fn arguments(&self) -> &BTreeMap<String, ArgumentValue> {
        &self.arguments
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error(&self) -> Option<&SyntaxError> {
        self.error.as_ref()
    }

    /// Every traversed node permits `source`.
    pub fn permits(&self, source: &dyn CommandSource) -> Result<bool> {
        for parsed in &self.nodes {
            if !parsed.node.permits(source)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The executor to run, if the whole input parsed and ended on an
    /// executable node.
    pub(crate) fn executor(&self) -> Result<Arc<dyn GrammarExecutor>, SyntaxError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        self.nodes
            .last()
            .and_then(|parsed| parsed.node.executor())
            .ok_or_else(|| SyntaxError::new("incomplete command", self.cursor))
    }

    fn depth(&self) -> (usize, usize) {
        (self.nodes.len(), self.cursor)
    }
}

/// Parse `input` (the text after the alias) starting at `root`.
pub fn parse(root: &Arc<GrammarNode>, input: &str) -> ParseResults {
    let start = ParseResults {
        input: input.to_string(),
        nodes: vec![ParsedNode {
            node: Arc::clone(root),
            range: 0..0,
        }],
        arguments: BTreeMap::new(),
        cursor: 0,
        error: None,
    };
    descend(input, root, start)
}

fn descend(input: &str, node: &Arc<GrammarNode>, mut current: ParseResults) -> ParseResults {
    let start = skip_whitespace(input, current.cursor);
    if start == input.len() {
        current.cursor = start;
        return current;
    }

    let end = token_end(input, start);
    let token = &input[start..end];
    let children = node.resolved().children();
    let literals: Vec<&Arc<GrammarNode>> = children
        .iter()
        .filter(|c| c.is_literal() && c.name() == token)
        .collect();
    let candidates = if literals.is_empty() {
        children.iter().filter(|c| !c.is_literal()).collect()
    } else {
        literals
    };

    let mut best: Option<ParseResults> = None;
    for child in candidates {
        let attempt = match consume(child, input, start, end) {
            Ok((stop, value)) => {
                let mut next = current.clone();
                next.nodes.push(ParsedNode {
                    node: Arc::clone(child),
                    range: start..stop,
                });
                if let Some(value) = value {
                    next.arguments.insert(child.name().to_string(), value);
                }
                next.cursor = stop;
                let result = descend(input, child, next);
                if result.error.is_none() {
                    return result;
                }
                result
            }
            Err(error) => {
                let mut failed = current.clone();
                failed.cursor = start;
                failed.error = Some(error);
                failed
            }
        };
        best = Some(match best {
            Some(previous) if previous.depth() >= attempt.depth() => previous,
            _ => attempt,
        });
    }

    best.unwrap_or_else(|| {
        current.cursor = start;
        current.error = Some(SyntaxError::new(
            format!("unknown argument '{token}'"),
            start,
        ));
        current
    })
}

/// Consume input for `node` starting at `start`; `end` is the end of the
/// current token.
fn consume(
    node: &GrammarNode,
    input: &str,
    start: usize,
    end: usize,
) -> Result<(usize, Option<ArgumentValue>), SyntaxError> {
    let token = &input[start..end];
    match node.kind() {
        NodeKind::Literal | NodeKind::Redirect { .. } => Ok((end, None)),
        NodeKind::Argument { kind, .. } => match *kind {
            ArgumentKind::Word => Ok((end, Some(ArgumentValue::String(token.to_string())))),
            ArgumentKind::Integer { min, max } => {
                let value: i64 = token.parse().map_err(|_| {
                    SyntaxError::new(format!("expected integer, found '{token}'"), start)
                })?;
                if value < min || value > max {
                    return Err(SyntaxError::new(
                        format!("integer {value} is outside {min}..={max}"),
                        start,
                    ));
                }
                Ok((end, Some(ArgumentValue::Integer(value))))
            }
            ArgumentKind::Greedy => Ok((
                input.len(),
                Some(ArgumentValue::String(input[start..].trim_end().to_string())),
            )),
        },
    }
}

fn skip_whitespace(input: &str, from: usize) -> usize {
    input[from..]
        .find(|c: char| !c.is_whitespace())
        .map_or(input.len(), |i| from + i)
}

fn token_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(char::is_whitespace)
        .map_or(input.len(), |i| start + i)
}

/// Where completion applies: the node whose children are offered and the
/// partially typed token.
#[derive(Debug, Clone)]
pub(crate) struct CompletionPoint {
    /// Traversed nodes, ending with the parent of the token being typed.
    pub path: Vec<Arc<GrammarNode>>,
    pub arguments: BTreeMap<String, ArgumentValue>,
    pub partial: String,
}

impl CompletionPoint {
    fn new(
        nodes: &[ParsedNode],
        arguments: BTreeMap<String, ArgumentValue>,
        partial: String,
    ) -> Self {
        Self {
            path: nodes.iter().map(|p| Arc::clone(&p.node)).collect(),
            arguments,
            partial,
        }
    }

    pub fn parent(&self) -> Option<&GrammarNode> {
        self.path.last().map(|node| node.resolved())
    }
}

/// Locate the completion point for `input`, or `None` when the input has
/// already diverged from the grammar before its final token.
pub(crate) fn completion_point(root: &Arc<GrammarNode>, input: &str) -> Option<CompletionPoint> {
    let results = parse(root, input);
    let nodes = results.nodes;

    match results.error {
        None => {
            let last = nodes.last()?;
            let greedy = matches!(
                last.node.kind(),
                NodeKind::Argument {
                    kind: ArgumentKind::Greedy,
                    ..
                }
            );
            let token_finished = input.is_empty() || input.ends_with(char::is_whitespace);
            if token_finished && !greedy {
                return Some(CompletionPoint::new(&nodes, results.arguments, String::new()));
            }
            if nodes.len() < 2 {
                return None;
            }
            // The last token is still being typed; complete it from its parent.
            let mut arguments = results.arguments;
            arguments.remove(last.node.name());
            let partial = input[last.range.start..].to_string();
            Some(CompletionPoint::new(
                &nodes[..nodes.len() - 1],
                arguments,
                partial,
            ))
        }
        Some(error) => {
            let rest = &input[error.cursor..];
            if rest.contains(char::is_whitespace) {
                return None;
            }
            Some(CompletionPoint::new(
                &nodes,
                results.arguments,
                rest.to_string(),
            ))
        }
    }
}

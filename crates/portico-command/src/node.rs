//! Grammar tree nodes.
//!
//! A [`GrammarNode`] is a literal token, a typed argument slot, or a
//! redirect onto another node. Nodes are built bottom-up with the builder
//! methods and are immutable once they are handed to the command manager;
//! the manager grafts copies of them under each alias.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::source::CommandSource;

/// Permission predicate attached to a node.
pub type Requirement = Arc<dyn Fn(&dyn CommandSource) -> Result<bool> + Send + Sync>;

/// Body of a grammar command, attached to the node where input may end.
#[async_trait]
pub trait GrammarExecutor: Send + Sync {
    async fn run(&self, context: CommandContext) -> Result<()>;
}

#[async_trait]
impl<F, Fut> GrammarExecutor for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn run(&self, context: CommandContext) -> Result<()> {
        (self)(context).await
    }
}

/// Supplies completions for an argument node.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, context: SuggestionContext) -> Result<Vec<String>>;
}

#[async_trait]
impl<F, Fut> SuggestionProvider for F
where
    F: Fn(SuggestionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>>> + Send + 'static,
{
    async fn suggest(&self, context: SuggestionContext) -> Result<Vec<String>> {
        (self)(context).await
    }
}

/// Value captured by an argument node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    String(String),
    Integer(i64),
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::String(s) => f.write_str(s),
            ArgumentValue::Integer(n) => write!(f, "{n}"),
        }
    }
}

/// How an argument node consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// A single whitespace-delimited token.
    Word,
    /// A single token parsed as an integer within `min..=max`.
    Integer { min: i64, max: i64 },
    /// Everything up to the end of the input.
    Greedy,
}

impl ArgumentKind {
    /// An integer argument with no bounds.
    pub fn integer() -> Self {
        ArgumentKind::Integer {
            min: i64::MIN,
            max: i64::MAX,
        }
    }
}

/// Shape of a node.
#[derive(Clone)]
pub enum NodeKind {
    Literal,
    Argument {
        kind: ArgumentKind,
        suggester: Option<Arc<dyn SuggestionProvider>>,
    },
    /// Matches like a literal, then continues at `target`'s children.
    Redirect { target: Arc<GrammarNode> },
}

/// One node of the command grammar.
#[derive(Clone)]
pub struct GrammarNode {
    name: String,
    kind: NodeKind,
    children: Vec<Arc<GrammarNode>>,
    requirement: Option<Requirement>,
    executor: Option<Arc<dyn GrammarExecutor>>,
}

impl GrammarNode {
    /// A literal token, e.g. `deposit`.
    pub fn literal(name: impl Into<String>) -> Self {
        Self::new(name.into(), NodeKind::Literal)
    }

    /// A typed argument slot, e.g. `<amount>`.
    pub fn argument(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self::new(
            name.into(),
            NodeKind::Argument {
                kind,
                suggester: None,
            },
        )
    }

    /// A literal named `name` that continues parsing at `target`.
    pub(crate) fn redirect(name: impl Into<String>, target: Arc<GrammarNode>) -> Self {
        Self::new(name.into(), NodeKind::Redirect { target })
    }

    fn new(name: String, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            children: Vec::new(),
            requirement: None,
            executor: None,
        }
    }

    /// Append a child. A literal child with the same name as an existing
    /// literal child is merged into it.
    pub fn then(mut self, child: GrammarNode) -> Self {
        self.add_child(child);
        self
    }

    /// Require `predicate` to permit the source before this node may be
    /// used.
    pub fn requires<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&dyn CommandSource) -> Result<bool> + Send + Sync + 'static,
    {
        self.requirement = Some(Arc::new(predicate));
        self
    }

    /// Allow input to end at this node, running `executor`.
    pub fn executes(mut self, executor: impl GrammarExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Attach a completion provider. Ignored on non-argument nodes.
    pub fn suggests(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        if let NodeKind::Argument { suggester, .. } = &mut self.kind {
            *suggester = Some(Arc::new(provider));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Arc<GrammarNode>] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Arc<GrammarNode>> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal | NodeKind::Redirect { .. })
    }

    pub fn has_executor(&self) -> bool {
        self.resolved().executor.is_some()
    }

    /// The node whose children and executor apply after this node matched.
    pub fn resolved(&self) -> &GrammarNode {
        match &self.kind {
            NodeKind::Redirect { target } => target,
            _ => self,
        }
    }

    pub(crate) fn executor(&self) -> Option<Arc<dyn GrammarExecutor>> {
        self.resolved().executor.clone()
    }

    pub(crate) fn suggester(&self) -> Option<&Arc<dyn SuggestionProvider>> {
        match &self.kind {
            NodeKind::Argument { suggester, .. } => suggester.as_ref(),
            _ => None,
        }
    }

    /// Evaluate this node's own requirement.
    pub fn can_use(&self, source: &dyn CommandSource) -> Result<bool> {
        match &self.requirement {
            Some(requirement) => requirement(source),
            None => Ok(true),
        }
    }

    /// Evaluate this node's requirement and, for a redirect, the target's.
    pub fn permits(&self, source: &dyn CommandSource) -> Result<bool> {
        if !self.can_use(source)? {
            return Ok(false);
        }
        match &self.kind {
            NodeKind::Redirect { target } => target.can_use(source),
            _ => Ok(true),
        }
    }

    pub(crate) fn add_child(&mut self, child: GrammarNode) {
        if matches!(child.kind, NodeKind::Literal) {
            if let Some(existing) = self
                .children
                .iter_mut()
                .find(|c| matches!(c.kind, NodeKind::Literal) && c.name == child.name)
            {
                Arc::make_mut(existing).merge(child);
                return;
            }
        }
        self.children.push(Arc::new(child));
    }

    fn merge(&mut self, other: GrammarNode) {
        if other.requirement.is_some() {
            self.requirement = other.requirement;
        }
        if other.executor.is_some() {
            self.executor = other.executor;
        }
        for grandchild in other.children {
            self.add_child(Arc::unwrap_or_clone(grandchild));
        }
    }

    /// Copy this subtree into freshly allocated nodes.
    ///
    /// Behaviour (requirements, executors, providers) is shared; structure
    /// is not. A redirect keeps pointing at its original target.
    pub(crate) fn deep_copy(&self) -> GrammarNode {
        GrammarNode {
            name: self.name.clone(),
            kind: self.kind.clone(),
            children: self
                .children
                .iter()
                .map(|c| Arc::new(c.deep_copy()))
                .collect(),
            requirement: self.requirement.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl fmt::Debug for GrammarNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Literal => "literal".to_string(),
            NodeKind::Argument { kind, .. } => format!("argument({kind:?})"),
            NodeKind::Redirect { target } => format!("redirect({})", target.name),
        };
        f.debug_struct("GrammarNode")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("children", &self.children)
            .field("requirement", &self.requirement.is_some())
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

/// What a grammar executor sees when its command runs.
#[derive(Clone)]
pub struct CommandContext {
    pub source: Arc<dyn CommandSource>,
    /// The alias as typed, case-folded.
    pub alias: String,
    /// Input after the alias.
    pub input: String,
    pub arguments: BTreeMap<String, ArgumentValue>,
}

impl CommandContext {
    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    pub fn string_argument(&self, name: &str) -> Option<&str> {
        match self.arguments.get(name) {
            Some(ArgumentValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer_argument(&self, name: &str) -> Option<i64> {
        match self.arguments.get(name) {
            Some(ArgumentValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}

/// What a suggestion provider sees.
#[derive(Clone)]
pub struct SuggestionContext {
    pub source: Arc<dyn CommandSource>,
    pub alias: String,
    /// Arguments parsed before the position being completed.
    pub arguments: BTreeMap<String, ArgumentValue>,
    /// The partially typed token being completed (possibly empty).
    pub partial: String,
}

//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::collections::HashSet;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use portico_command::{
    CommandManager, CommandSource, DispatchOutcome, InvocableCommand, Invocation,
};

/// A source with a fixed permission set.
pub struct TestSource {
    name: String,
    permissions: Option<HashSet<String>>,
}

impl CommandSource for TestSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        match &self.permissions {
            None => true,
            Some(granted) => granted.contains(permission),
        }
    }
}

/// A source holding every permission.
pub fn source() -> Arc<dyn CommandSource> {
    Arc::new(TestSource {
        name: "console".into(),
        permissions: None,
    })
}

/// A source holding only `permissions`.
pub fn player(name: &str, permissions: &[&str]) -> Arc<dyn CommandSource> {
    Arc::new(TestSource {
        name: name.into(),
        permissions: Some(permissions.iter().map(|p| p.to_string()).collect()),
    })
}

/// The error tests use to recognize their own failures in a chain.
#[derive(Debug, thiserror::Error)]
#[error("boom")]
pub struct Boom;

/// Number of wrapping layers between `err` and the first `E` in its
/// source chain.
pub fn wrap_depth<E: Error + 'static>(err: &(dyn Error + 'static)) -> Option<usize> {
    let mut depth = 0;
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<E>() {
            return Some(depth);
        }
        depth += 1;
        current = e.source();
    }
    None
}

type Hook<A, T> = Box<dyn Fn(&Invocation<A>) -> anyhow::Result<T> + Send + Sync>;

fn hook<A, T>(
    f: impl Fn(&Invocation<A>) -> anyhow::Result<T> + Send + Sync + 'static,
) -> Hook<A, T> {
    Box::new(f)
}

/// How often each hook of a [`MockCommand`] ran.
#[derive(Debug, Default)]
pub struct CallStats {
    executed: AtomicUsize,
    permission_checks: AtomicUsize,
    suggested: AtomicUsize,
}

impl CallStats {
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn permission_checks(&self) -> usize {
        self.permission_checks.load(Ordering::SeqCst)
    }

    pub fn suggested(&self) -> usize {
        self.suggested.load(Ordering::SeqCst)
    }
}

/// Whitespace-split arguments.
pub type MockSimple = MockCommand<Vec<String>>;

/// One raw argument string.
pub type MockRaw = MockCommand<String>;

/// A simple or raw command assembled from closures.
pub struct MockCommand<A> {
    stats: Arc<CallStats>,
    execute: Hook<A, ()>,
    permission: Hook<A, bool>,
    suggest: Hook<A, Vec<String>>,
}

impl<A: Send + Sync + 'static> MockCommand<A> {
    /// Permits everyone, executes successfully, suggests nothing.
    pub fn new() -> Self {
        Self {
            stats: Arc::new(CallStats::default()),
            execute: hook(|_| Ok(())),
            permission: hook(|_| Ok(true)),
            suggest: hook(|_| Ok(Vec::new())),
        }
    }

    /// Fails the test if executed.
    pub fn never_executed() -> Self {
        Self::new().on_execute(|invocation| panic!("{} must not execute", invocation.alias()))
    }

    pub fn on_execute(
        mut self,
        f: impl Fn(&Invocation<A>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.execute = hook(f);
        self
    }

    pub fn on_permission(
        mut self,
        f: impl Fn(&Invocation<A>) -> anyhow::Result<bool> + Send + Sync + 'static,
    ) -> Self {
        self.permission = hook(f);
        self
    }

    pub fn on_suggest(
        mut self,
        f: impl Fn(&Invocation<A>) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    ) -> Self {
        self.suggest = hook(f);
        self
    }

    pub fn stats(&self) -> Arc<CallStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl<A: Send + Sync + 'static> InvocableCommand<A> for MockCommand<A> {
    async fn execute(&self, invocation: &Invocation<A>) -> anyhow::Result<()> {
        self.stats.executed.fetch_add(1, Ordering::SeqCst);
        (self.execute)(invocation)
    }

    async fn suggest(&self, invocation: &Invocation<A>) -> anyhow::Result<Vec<String>> {
        self.stats.suggested.fetch_add(1, Ordering::SeqCst);
        (self.suggest)(invocation)
    }

    fn has_permission(&self, invocation: &Invocation<A>) -> anyhow::Result<bool> {
        self.stats.permission_checks.fetch_add(1, Ordering::SeqCst);
        (self.permission)(invocation)
    }
}

/// Dispatch `line` and require that it was forwarded.
pub async fn assert_forwarded(manager: &CommandManager, line: &str) {
    let handle = manager
        .execute_async(source(), line)
        .expect("dispatch should not fail");
    assert!(handle.is_forwarded(), "expected {line:?} to be forwarded");
    assert_eq!(handle.join().await.unwrap(), DispatchOutcome::Forwarded);
}

/// Dispatch `line` and require that a command handled it.
pub async fn assert_handled(manager: &CommandManager, line: &str) {
    let handle = manager
        .execute_async(source(), line)
        .expect("dispatch should not fail");
    assert!(!handle.is_forwarded(), "expected {line:?} to be handled");
    assert_eq!(handle.join().await.unwrap(), DispatchOutcome::Handled);
}

/// Request completions for `line` and compare them in order.
pub async fn assert_suggestions(manager: &CommandManager, line: &str, expected: &[&str]) {
    let found = manager
        .suggest(source(), line)
        .await
        .expect("suggestions should not fail");
    assert_eq!(found, expected, "suggestions for {line:?}");
}

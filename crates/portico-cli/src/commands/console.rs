//! `portico console`: an interactive command loop on stdin.
//!
//! Every line is dispatched as the console source. A line starting with `?`
//! asks for completions of the text after it instead.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;

use portico_command::{CommandManager, CommandSource, DispatchOutcome};
use portico_types::PorticoConfig;

use crate::commands::builtins::{self, ConsoleSource};

/// Run `portico console [--config PATH]`.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => PorticoConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PorticoConfig::default(),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let (console, mut output) = Console::new(&config)?;
    info!(
        commands = console.manager.aliases().len(),
        servers = config.servers.len(),
        "console ready"
    );

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let replies = rt.block_on(console.handle_line(&line));
        for printed in drain(&mut output) {
            println!("{printed}");
        }
        for reply in replies {
            println!("{reply}");
        }
    }

    Ok(())
}

/// A command manager with the built-ins registered, driven as the console.
pub struct Console {
    manager: Arc<CommandManager>,
    source: Arc<dyn CommandSource>,
}

impl Console {
    /// Build the manager and register the built-in commands. Returns the
    /// receiving end of the built-ins' output channel.
    pub fn new(config: &PorticoConfig) -> Result<(Self, UnboundedReceiver<String>)> {
        let manager = Arc::new(CommandManager::with_config(config.commands.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        builtins::register_all(&manager, config, tx)?;
        Ok((
            Self {
                manager,
                source: Arc::new(ConsoleSource),
            },
            rx,
        ))
    }

    /// Dispatch or complete one line. Returns status lines for the operator;
    /// command failures are reported, never propagated.
    pub async fn handle_line(&self, line: &str) -> Vec<String> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if let Some(partial) = trimmed.strip_prefix('?') {
            return match self.manager.suggest(Arc::clone(&self.source), partial).await {
                Ok(found) if found.is_empty() => vec!["(no suggestions)".to_string()],
                Ok(found) => vec![found.join("  ")],
                Err(e) => vec![format!("error: {:#}", anyhow::Error::new(e))],
            };
        }

        match self.manager.execute(Arc::clone(&self.source), line).await {
            Ok(DispatchOutcome::Handled) => Vec::new(),
            Ok(DispatchOutcome::Forwarded) => {
                vec![format!("no backend connected, dropping: {}", line.trim())]
            }
            Ok(DispatchOutcome::Invalid(error)) => vec![format!("invalid command: {error}")],
            Err(e) => vec![format!("error: {:#}", anyhow::Error::new(e))],
        }
    }
}

fn drain(output: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = output.try_recv() {
        lines.push(line);
    }
    lines
}

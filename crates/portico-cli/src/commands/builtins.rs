//! Commands the console registers at startup.
//!
//! Command output is sent over a channel rather than printed, so the
//! console loop decides where it goes.

use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use portico_command::{
    ArgumentKind, Command, CommandContext, CommandManager, CommandMeta, CommandSource,
    GrammarNode, InvocableCommand, RawInvocation, SimpleInvocation, SuggestionContext,
};
use portico_types::{PorticoConfig, ServerConfig};

/// Permission required to switch backends.
pub const SERVER_PERMISSION: &str = "portico.command.server";

/// The operator at the terminal. Holds every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSource;

impl CommandSource for ConsoleSource {
    fn name(&self) -> &str {
        "console"
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}

/// Lines produced by built-in commands.
pub type Output = UnboundedSender<String>;

fn emit(out: &Output, line: String) -> Result<()> {
    out.send(line).ok().context("console output closed")
}

/// `help [prefix]`: list registered aliases.
struct HelpCommand {
    manager: Weak<CommandManager>,
    out: Output,
}

#[async_trait]
impl InvocableCommand<Vec<String>> for HelpCommand {
    async fn execute(&self, invocation: &SimpleInvocation) -> Result<()> {
        let manager = self.manager.upgrade().context("command manager is gone")?;
        let prefix = invocation
            .arguments()
            .first()
            .map(|p| p.to_lowercase())
            .unwrap_or_default();
        let aliases: Vec<String> = manager
            .aliases()
            .into_iter()
            .filter(|alias| alias.starts_with(&prefix))
            .collect();
        if aliases.is_empty() {
            return emit(&self.out, format!("No commands match '{prefix}'"));
        }
        emit(&self.out, format!("Commands: {}", aliases.join(", ")))
    }

    async fn suggest(&self, invocation: &SimpleInvocation) -> Result<Vec<String>> {
        let Some(manager) = self.manager.upgrade() else {
            return Ok(Vec::new());
        };
        if invocation.arguments().len() > 1 {
            return Ok(Vec::new());
        }
        let prefix = invocation
            .arguments()
            .first()
            .map(|p| p.to_lowercase())
            .unwrap_or_default();
        Ok(manager
            .aliases()
            .into_iter()
            .filter(|alias| alias.starts_with(&prefix) && *alias != prefix)
            .collect())
    }
}

/// `echo <text>` / `say <text>`: repeat the text verbatim.
struct EchoCommand {
    out: Output,
}

#[async_trait]
impl InvocableCommand<String> for EchoCommand {
    async fn execute(&self, invocation: &RawInvocation) -> Result<()> {
        emit(&self.out, invocation.arguments().clone())
    }
}

/// `server [name]`: list backends, or pick one to connect to.
fn server_command(config: PorticoConfig, out: Output) -> GrammarNode {
    let config = Arc::new(config);

    let list = {
        let config = Arc::clone(&config);
        let out = out.clone();
        move |_ctx: CommandContext| {
            let names: Vec<String> = config.servers.iter().map(|s| s.name.clone()).collect();
            let out = out.clone();
            async move {
                if names.is_empty() {
                    return emit(&out, "No servers configured".to_string());
                }
                emit(&out, format!("Available servers: {}", names.join(", ")))
            }
        }
    };

    let connect = {
        let config = Arc::clone(&config);
        move |ctx: CommandContext| {
            let target = ctx.string_argument("name").unwrap_or_default().to_string();
            let found: Option<ServerConfig> = config.server(&target).cloned();
            let out = out.clone();
            async move {
                let server = found.with_context(|| format!("unknown server '{target}'"))?;
                emit(
                    &out,
                    format!("Connecting to {} ({})", server.name, server.address),
                )
            }
        }
    };

    let complete = move |ctx: SuggestionContext| {
        let partial = ctx.partial.to_lowercase();
        let names: Vec<String> = config
            .servers
            .iter()
            .filter(|s| s.name.to_lowercase().starts_with(&partial))
            .map(|s| s.name.clone())
            .collect();
        async move { Ok::<_, anyhow::Error>(names) }
    };

    GrammarNode::literal("server")
        .requires(|source: &dyn CommandSource| Ok(source.has_permission(SERVER_PERMISSION)))
        .executes(list)
        .then(
            GrammarNode::argument("name", ArgumentKind::Word)
                .suggests(complete)
                .executes(connect),
        )
}

/// Register `help`, `echo`/`say`, and `server` on `manager`.
pub fn register_all(manager: &Arc<CommandManager>, config: &PorticoConfig, out: Output) -> Result<()> {
    manager.register(
        CommandMeta::builder("help").alias("commands").build(),
        Command::simple(HelpCommand {
            manager: Arc::downgrade(manager),
            out: out.clone(),
        }),
    )?;

    manager.register(
        CommandMeta::builder("echo").alias("say").build(),
        Command::raw(EchoCommand { out: out.clone() }),
    )?;

    let server = server_command(config.clone(), out);
    manager.register(CommandMeta::for_grammar(&server).build(), Command::grammar(server))?;

    Ok(())
}

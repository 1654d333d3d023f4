mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Portico -- command console for the proxy front end.
#[derive(Parser, Debug)]
#[command(name = "portico", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read command lines from stdin and dispatch them as the console
    Console {
        /// Path to a portico.toml configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a portico.toml configuration file
    CheckConfig {
        /// Path to the configuration file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Console { config } => commands::console::run(config.as_deref()),
        Commands::CheckConfig { path } => commands::check_config::run(&path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn console_config_is_optional() {
        let cli = Cli::try_parse_from(["portico", "console"]).unwrap();
        assert!(matches!(cli.command, Commands::Console { config: None }));

        let cli = Cli::try_parse_from(["portico", "check-config", "portico.toml"]).unwrap();
        let Commands::CheckConfig { path } = cli.command else {
            panic!("expected check-config");
        };
        assert_eq!(path, PathBuf::from("portico.toml"));
    }
}

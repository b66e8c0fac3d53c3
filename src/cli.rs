//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use graphsmith::output::OutputConfig;

use crate::commands;

/// graphsmith - Dependency graphs, binary caching and project generation
#[derive(Parser, Debug)]
#[command(name = "graphsmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the cache hashes of cacheable targets
    Hash(commands::hash::HashArgs),

    /// Generate the workspace, replacing cached targets with binaries
    Generate(commands::generate::GenerateArgs),

    /// Display the target dependency tree
    Graph(commands::graph::GraphArgs),

    /// Manage the local binary cache
    Cache(commands::cache::CacheArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Hash(args) => commands::hash::execute(args),
            Commands::Generate(args) => commands::generate::execute(args, &output),
            Commands::Graph(args) => commands::graph::execute(args),
            Commands::Cache(args) => commands::cache::execute(args, &output),
        }
    }
}

/// Initializes `env_logger` with `level` as the default filter. `RUST_LOG`
/// takes precedence when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "graphsmith",
            "generate",
            "--manifest",
            "ws.yaml",
            "--dry-run",
            "--source",
            "Core",
            "--source",
            "Feature",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert!(args.dry_run);
                assert!(!args.no_binary_cache);
                assert_eq!(args.sources, vec!["Core", "Feature"]);
            }
            other => panic!("Expected generate, got {:?}", other),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_cache_store_requires_paths() {
        assert!(Cli::try_parse_from(["graphsmith", "cache", "store", "Core", "abc"]).is_err());
    }
}

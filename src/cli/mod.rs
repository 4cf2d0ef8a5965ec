//! Command-line interface parsed with clap.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SpoilerHub - movie metadata and AI spoiler explanations over HTTP
#[derive(Parser)]
#[command(name = "spoilerhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of the default search locations
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Validate the configuration and print it with secrets masked
    Check,

    /// Create a default config file
    #[command(alias = "init")]
    InitConfig,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::parse_from(["spoilerhub"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["spoilerhub", "check", "--config", "/etc/spoilerhub.toml"]);
        assert_eq!(cli.command, Some(Commands::Check));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/spoilerhub.toml")));
    }

    #[test]
    fn init_config_has_short_alias() {
        let cli = Cli::parse_from(["spoilerhub", "init"]);
        assert_eq!(cli.command, Some(Commands::InitConfig));
    }
}

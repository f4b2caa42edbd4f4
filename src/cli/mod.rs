//! CLI module for Warden
//!
//! Provides command-line interface parsing and handling for the warden-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

/// `init` scaffolding.
pub mod init;
/// Colored terminal output.
pub mod output;
/// Offline `hash`, `inspect` and `verify` helpers.
pub mod tokens;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Warden - user management behind composable request gates
///
/// Serves the account API, and offers offline helpers for hashing
/// passwords and examining tokens.
#[derive(Parser, Debug)]
#[command(
    name = "warden-server",
    version,
    about = "Warden - user management with stateless bearer tokens",
    long_about = "A user-management HTTP API that authenticates clients with signed bearer\n\
                  tokens and validates every request through an ordered chain of gates.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  warden-server init                 # Write warden.toml and .env.example\n    \
                  warden-server                      # Start the server (requires warden.toml)\n    \
                  warden-server --config my.toml     # Use a custom config file\n    \
                  warden-server hash 'hunter2hunter2'\n    \
                  warden-server inspect <token>      # Show claims without checking them"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "warden.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Write a starter warden.toml, .env.example and .gitignore
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Show the effective configuration
    Config {
        /// Only validate, print nothing on success
        #[arg(long)]
        validate: bool,
    },

    /// Print the Argon2id hash of a password
    Hash {
        /// Plaintext password
        password: String,
    },

    /// Decode a token's claims WITHOUT checking signature or expiry
    Inspect {
        /// Compact token (`header.claims.signature`)
        token: String,
    },

    /// Verify a token against the configured secret
    Verify {
        /// Compact token (`header.claims.signature`)
        token: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, `serve` when none was given
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["warden-server"]).unwrap();
        assert_eq!(cli.command(), &Commands::Serve);
        assert_eq!(cli.config, PathBuf::from("warden.toml"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["warden-server", "verify", "a.b.c", "--config", "x.toml", "--no-color"])
                .unwrap();
        assert_eq!(
            cli.command(),
            &Commands::Verify {
                token: "a.b.c".to_string()
            }
        );
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(cli.no_color);
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["warden-server", "init"]).unwrap();
        match cli.command() {
            Commands::Init {
                path,
                force,
                host,
                port,
            } => {
                assert_eq!(path, &PathBuf::from("."));
                assert!(!force);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(*port, 8080);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_hash_requires_password() {
        assert!(Cli::try_parse_from(["warden-server", "hash"]).is_err());
    }
}

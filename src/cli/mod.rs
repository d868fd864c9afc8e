//! CLI module for jose-session
//!
//! Subcommands:
//! - `serve`: demo web application with login and JWKS endpoints
//! - `keygen`: generate an RSA key store
//! - `mint`: print a signed token for the configured key store

pub mod keygen;
pub mod mint;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};
use validator::Validate;

use crate::config::{AppConfig, LoggingConfig};
use crate::infrastructure::logging::{self, LogOutput};

/// Stateless JWT sessions backed by an RSA key store
#[derive(Parser)]
#[command(name = "jose-session")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the demo web application
    Serve(serve::ServeArgs),

    /// Generate an RSA key store
    Keygen(keygen::KeygenArgs),

    /// Mint a token with the configured key store
    Mint(mint::MintArgs),
}

impl Command {
    /// `keygen` and `mint` print their result on stdout, so logs go to stderr
    pub fn log_output(&self) -> LogOutput {
        match self {
            Self::Serve(_) => LogOutput::Stdout,
            Self::Keygen(_) | Self::Mint(_) => LogOutput::Stderr,
        }
    }
}

/// `.env`, then configuration files and environment, validated
fn load_config(output: LogOutput) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    logging::init_logging(&config.logging, output);
    Ok(config)
}

fn init_default_logging(output: LogOutput) {
    dotenvy::dotenv().ok();
    logging::init_logging(&LoggingConfig::default(), output);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_result_printing_commands_log_to_stderr() {
        assert_eq!(command(&["jose-session", "serve"]).log_output(), LogOutput::Stdout);
        assert_eq!(command(&["jose-session", "keygen"]).log_output(), LogOutput::Stderr);
        assert_eq!(
            command(&["jose-session", "mint", "--claim", "sub=alice"]).log_output(),
            LogOutput::Stderr
        );
    }
}

//! Newslens server binary
//!
//! Starts the HTTP server for article analysis.

use anyhow::{Context, Result};
use clap::Parser;
use newslens_server::{config::ServerConfig, start_server};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Newslens - AI news article analyzer backend
#[derive(Debug, Parser)]
#[command(name = "newslens-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NEWSLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address from the configuration
    #[arg(long)]
    bind_address: Option<String>,

    /// Override the bind port from the configuration
    #[arg(long)]
    bind_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using default test configuration");
            eprintln!("Usage: newslens-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default_test_config()
        }
    };

    if let Some(bind_address) = cli.bind_address {
        config.bind_address = bind_address;
    }
    if let Some(bind_port) = cli.bind_port {
        config.bind_port = bind_port;
    }

    start_server(config).await.context("Server stopped")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "newslens-server",
            "--config",
            "newslens.toml",
            "--bind-port",
            "9000",
            "--bind-address",
            "127.0.0.1",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("newslens.toml")));
        assert_eq!(cli.bind_port, Some(9000));
        assert_eq!(cli.bind_address.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["newslens-server", "--bind-port", "http"]).is_err());
    }
}

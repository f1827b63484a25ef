//! Procura CLI
//!
//! A command-line interface for the supplier/consumer marketplace backend.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use procura_ops::{OpsClient, OpsConfig};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Procura CLI: manage a marketplace company's catalog, staff and linkings.
#[derive(Parser, Debug)]
#[command(name = "procura", version, about)]
struct Cli {
    /// Backend endpoint URL.
    #[arg(long, env = "PROCURA_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Access token for authenticated calls.
    #[arg(long, env = "PROCURA_ACCESS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// TOML configuration file (`endpoint`, `access_token`, `timeout_secs`).
    #[arg(long, env = "PROCURA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the access token.
    Login(commands::login::LoginArgs),
    /// Manage catalog items and their pictures.
    Catalog(commands::catalog::CatalogArgs),
    /// Manage company staff.
    Users(commands::users::UsersArgs),
    /// Review and answer linking requests.
    Linkings(commands::linkings::LinkingsArgs),
    /// Show company details.
    Company(commands::company::CompanyArgs),
    /// List supported cities.
    Cities,
}

impl Cli {
    fn ops_config(&self) -> anyhow::Result<OpsConfig> {
        let mut config = match self.config {
            Some(ref path) => OpsConfig::from_file(path)?,
            None => OpsConfig::from_env(),
        };
        if let Some(ref endpoint) = self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(ref token) = self.token {
            config = config.with_access_token(token);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = cli.ops_config()?;
    debug!(?config, "resolved configuration");
    let mut ops = OpsClient::from_config(&config)?;

    match cli.command {
        Command::Login(args) => commands::login::run(&ops, &args, &cli.format).await,
        Command::Catalog(args) => commands::catalog::run(&mut ops, &args, &cli.format).await,
        Command::Users(args) => commands::users::run(&mut ops, &args, &cli.format).await,
        Command::Linkings(args) => commands::linkings::run(&mut ops, &args, &cli.format).await,
        Command::Company(args) => commands::company::run(&ops, &args, &cli.format).await,
        Command::Cities => commands::cities::run(&mut ops, &cli.format).await,
    }
}

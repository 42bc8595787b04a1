//! Vault server entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use vault_protocol::config::VaultConfig;
use vault_protocol::service::Server;
use vault_protocol::storage::MemoryStore;
use vault_protocol::utils::{logging, metrics};
use vault_protocol::Result;

/// Encrypted secrets vault server
#[derive(Parser, Debug)]
#[command(name = "vault-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server
    ///
    /// Settings come from the config file when given, then `VAULT_*`
    /// environment variables are applied on top.
    Start {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file and print any problems
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print a configuration file with default values
    ExampleConfig,
}

fn load_config(path: Option<&Path>) -> Result<VaultConfig> {
    let mut config = match path {
        Some(path) => VaultConfig::from_file(path)?,
        None => VaultConfig::default(),
    };
    config.apply_env()?;
    config.validate_strict()?;
    Ok(config)
}

async fn start(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_deref())?;
    logging::init_logging(&config.logging)?;
    metrics::init_metrics();

    let server = Server::bind(&config, Arc::new(MemoryStore::new())).await?;
    info!(
        address = %server.local_addr()?,
        max_connections = config.server.max_connections,
        "Vault server started"
    );
    server.run().await
}

fn validate(path: &Path) -> Result<()> {
    let config = VaultConfig::from_file(path)?;
    let problems = config.validate();
    if problems.is_empty() {
        println!("Configuration OK: {}", path.display());
        Ok(())
    } else {
        for problem in &problems {
            eprintln!("  - {problem}");
        }
        config.validate_strict()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start { config } => start(config).await,
        Commands::Validate { config } => validate(&config),
        Commands::ExampleConfig => {
            print!("{}", VaultConfig::example_config());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "vault-server failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

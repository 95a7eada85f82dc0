//! BALLOTBOX Node Binary

use ballotbox_core::{NodeConfig, VoterId};
use ballotbox_ledger::RegistrySnapshot;
use ballotbox_node::NodeBuilder;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ballotbox-node")]
#[command(about = "BALLOTBOX Node - deadline-bounded yes/no voting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Votes each proposal accepts
        #[arg(long)]
        max_votes: Option<u32>,

        /// Only this voter id (hex) may create proposals
        #[arg(long)]
        owner: Option<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the contents of a snapshot file
    Inspect {
        /// Snapshot file path
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            api_addr,
            data_dir,
            max_votes,
            owner,
        } => {
            let config = match config {
                Some(path) => NodeConfig::load(&path)?,
                None => NodeConfig::default(),
            };
            init_logging(&config.log_level);

            info!("🗳️ Starting BALLOTBOX Node...");

            let mut builder = NodeBuilder::new().config(config);
            if let Some(addr) = api_addr {
                builder = builder.api_addr(&addr);
            }
            if let Some(dir) = data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some(max_votes) = max_votes {
                builder = builder.max_votes(max_votes);
            }
            if let Some(owner) = owner {
                builder = builder.owner(VoterId::from_hex(&owner)?);
            }

            let node = builder.build().await?;
            node.start().await?;
        }

        Commands::InitConfig { output } => {
            let json = NodeConfig::default().to_json()?;
            std::fs::write(&output, &json)?;
            println!("Configuration saved to: {}", output.display());
        }

        Commands::Inspect { snapshot } => {
            let bytes = std::fs::read(&snapshot)?;
            let snapshot = RegistrySnapshot::from_bytes(&bytes)?;
            snapshot.verify()?;
            println!("{}", snapshot.to_json()?);
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use luigi::config::Config;

mod cmd;

const DEFAULT_LOG_FILTER: &str = "luigi=info,tower_http=info";

#[derive(Parser)]
#[command(name = "luigi")]
#[command(version, about = "Turn Jira tickets into coding-agent runs against local repositories")]
pub struct Cli {
    /// Path to luigi.toml (defaults to ./luigi.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Debug-level logging for luigi (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository store directory (overrides LUIGI_REPOS_DIR and the config file)
    #[arg(long, global = true)]
    pub repos_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Listen on all interfaces and allow any CORS origin
        #[arg(long)]
        dev: bool,
    },
    /// Generate luigi.md for one repository, or every repository in the store
    Init {
        #[arg(long)]
        repo: Option<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "luigi=debug,tower_http=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.repos_dir {
        config.repos_dir = config.workdir.join(dir);
    }

    match cli.command {
        Commands::Serve { host, port, dev } => {
            cmd::cmd_serve(config, host, port, dev).await?;
        }
        Commands::Init { repo } => {
            cmd::cmd_init(config, repo.as_deref()).await?;
        }
    }

    Ok(())
}

//! onboardctx CLI: the main entry point.
//!
//! Commands:
//! - `context` Print the token-budgeted onboarding context of a repository
//! - `list`    List repositories, or the documents of one repository
//! - `serve`   Run the MCP tool server on stdin/stdout
//! - `doctor`  Check configuration and data sources
//! - `init`    Write a default config file

use clap::{Parser, Subcommand};
use onboardctx_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "onboardctx",
    about = "onboardctx: token-budgeted onboarding context for coding assistants",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: ~/.onboardctx/config.toml)
    #[arg(long, global = true, env = "ONBOARDCTX_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the onboarding context of a repository
    Context {
        /// Repository whose onboarding documents to load
        #[arg(long = "repo_name")]
        repo_name: String,

        /// Maximum number of tokens to print
        #[arg(long = "token_budget", allow_negative_numbers = true)]
        token_budget: i64,

        /// Include code reference documents
        #[arg(long = "include_code")]
        include_code: bool,

        /// Print the full context as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known repositories, or the documents of one repository
    List {
        /// Repository whose documents to list
        #[arg(long = "repo_name")]
        repo_name: Option<String>,

        /// Include code reference documents
        #[arg(long = "include_code")]
        include_code: bool,
    },

    /// Run the MCP server on stdin/stdout
    Serve,

    /// Diagnose configuration and data sources
    Doctor,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries context text and JSON-RPC.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config_path();
    let outcome = match cli.command {
        Commands::Context {
            repo_name,
            token_budget,
            include_code,
            json,
        } => commands::context::run(&config_path, &repo_name, token_budget, include_code, json).await,
        Commands::List {
            repo_name,
            include_code,
        } => commands::list::run(&config_path, repo_name.as_deref(), include_code).await,
        Commands::Serve => commands::serve::run(&config_path).await,
        Commands::Doctor => commands::doctor::run(&config_path).await,
        Commands::Init { force } => commands::init::run(&config_path, force).await,
    };

    if let Err(e) = outcome {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    Ok(())
}

//! Tagline CLI - Tag suggestions for volunteer opportunities.
//!
//! Tagline reads a free-text opportunity description and suggests the most
//! relevant "interests" and "skills" tags, served over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Download the default model
//! tagline models download
//!
//! # Serve POST /get-tags on 127.0.0.1:8000
//! tagline serve
//!
//! # Tag one description
//! tagline tag "Teach seniors to use their smartphones"
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Tagline - Tag suggestions for volunteer opportunities.
#[derive(Parser, Debug)]
#[command(name = "tagline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the tagging HTTP endpoint
    Serve(cli::serve::ServeArgs),

    /// Tag a single description and print the result
    Tag(cli::tag::TagArgs),

    /// Manage models (download, list, verify)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go to stderr directly.
    let config = match tagline_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tagline config path`."
            );
            tagline_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tagline v{}", tagline_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args).await,
        Commands::Tag(args) => cli::tag::execute(args).await,
        Commands::Models(args) => cli::models::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

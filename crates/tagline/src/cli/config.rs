//! The `tagline config` command.

use clap::{Args, Subcommand};
use serde_json::json;
use tagline_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show {
        /// Print the active taxonomy as JSON instead
        #[arg(long)]
        taxonomy: bool,
    },

    /// Show config file path
    Path,

    /// Write a config file with the defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { taxonomy } => {
            let config = Config::load()?;
            if taxonomy {
                let taxonomy = config.taxonomy()?;
                let categories: serde_json::Map<String, serde_json::Value> = taxonomy
                    .categories()
                    .iter()
                    .map(|c| (c.name.clone(), json!(c.tags)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                println!("{}", config.to_toml()?);
            }
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

//! The `tagline serve` command.

use anyhow::Context;
use clap::Args;
use tagline_core::{Config, Tagger};

use super::TaggerArgs;
use crate::server;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub tagger: TaggerArgs,

    /// Address to bind (overrides server.host)
    #[arg(long, env = "TAGLINE_HOST")]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long, env = "TAGLINE_PORT")]
    pub port: Option<u16>,
}

/// Execute the serve command.
///
/// The tagger is fully built before the listener binds, so a missing model
/// or bad config stops the process without ever accepting a request.
pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    args.tagger.apply(&mut config)?;

    tracing::info!(
        "Loading {} model from {:?}",
        config.tagger.strategy,
        config.strategy_model_dir(config.tagger.strategy)
    );

    let load_config = config.clone();
    let tagger = tokio::task::spawn_blocking(move || Tagger::load(&load_config))
        .await
        .context("Tagger loading task failed")??;

    server::run(&config, tagger).await
}

//! The `tagline tag` command for one-off predictions.

use std::io::Read;

use anyhow::Context;
use clap::Args;
use serde_json::json;
use tagline_core::{Config, Tagger};

use super::TaggerArgs;

/// Arguments for the `tag` command.
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Description to tag, or `-` to read it from stdin
    pub text: String,

    #[command(flatten)]
    pub tagger: TaggerArgs,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the tag command.
pub async fn execute(args: TagArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    args.tagger.apply(&mut config)?;

    let text = if args.text == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read description from stdin")?;
        buf
    } else {
        args.text
    };

    let prediction = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let tagger = Tagger::load(&config)?;
        Ok(tagger.predict(&text)?)
    })
    .await
    .context("Tagging task failed")??;

    let output = json!({ "tags": prediction });
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    Ok(())
}

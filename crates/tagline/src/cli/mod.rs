//! Command implementations and the arguments they share.

pub mod config;
pub mod models;
pub mod serve;
pub mod tag;

use clap::{Args, ValueEnum};
use tagline_core::{Config, Strategy};

/// Scoring strategy as selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// NLI zero-shot classification (default)
    ZeroShot,
    /// Sentence-embedding cosine similarity
    Embeddings,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ZeroShot => Strategy::ZeroShot,
            StrategyArg::Embeddings => Strategy::Embeddings,
        }
    }
}

/// Tagger options accepted by `serve` and `tag`.
#[derive(Args, Debug, Clone, Default)]
pub struct TaggerArgs {
    /// Scoring strategy (overrides tagger.strategy)
    #[arg(long, value_enum, env = "TAGLINE_STRATEGY")]
    pub strategy: Option<StrategyArg>,

    /// Tags returned per category (overrides tagger.top_n)
    #[arg(long, env = "TAGLINE_TOP_N")]
    pub top_n: Option<usize>,
}

impl TaggerArgs {
    /// Apply the flags on top of the loaded config and re-validate.
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(strategy) = self.strategy {
            config.tagger.strategy = strategy.into();
        }
        if let Some(top_n) = self.top_n {
            config.tagger.top_n = top_n;
        }
        config.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        let args = TaggerArgs {
            strategy: Some(StrategyArg::Embeddings),
            top_n: Some(5),
        };

        args.apply(&mut config).unwrap();

        assert_eq!(config.tagger.strategy, Strategy::Embeddings);
        assert_eq!(config.tagger.top_n, 5);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        TaggerArgs::default().apply(&mut config).unwrap();

        assert_eq!(config.tagger.strategy, Strategy::ZeroShot);
        assert_eq!(config.tagger.top_n, 2);
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let mut config = Config::default();
        let args = TaggerArgs {
            strategy: None,
            top_n: Some(0),
        };

        assert!(args.apply(&mut config).is_err());
    }
}

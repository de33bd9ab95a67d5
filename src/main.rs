//! Self-play harness: plays one full game between the alpha-beta engine and
//! an opponent, logging every decision.

use clap::Parser;
use gametree_core::{Result, SearchConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod app;

use app::{GameKind, MatchSettings, Opponent};

#[derive(Parser, Debug)]
#[command(name = "gametree")]
#[command(version, about = "Play a game against the alpha-beta engine", long_about = None)]
struct Cli {
    /// Game to play
    #[arg(value_enum, default_value_t = GameKind::TicTacToe)]
    game: GameKind,

    /// JSON search configuration; missing fields take their defaults
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the maximum search depth
    #[arg(long, short = 'd')]
    depth: Option<u32>,

    /// Override the per-move time limit in milliseconds
    #[arg(long, short = 't')]
    time_limit_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = Opponent::Random)]
    opponent: Opponent,

    /// Seed for the random opponent
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Let the opponent move first
    #[arg(long)]
    engine_second: bool,

    /// Print the match summary as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<SearchConfig> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::load_from_json(&std::fs::read_to_string(path)?)?,
        None => SearchConfig::default(),
    };
    if let Some(depth) = cli.depth {
        config.max_depth = depth;
    }
    if cli.time_limit_ms.is_some() {
        config.time_limit_ms = cli.time_limit_ms;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let settings = MatchSettings {
        config: Arc::new(load_config(cli)?),
        opponent: cli.opponent,
        seed: cli.seed,
        engine_second: cli.engine_second,
    };

    let summary = app::run(cli.game, &settings)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.final_position);
        println!(
            "engine {:?} after {} plies ({} nodes searched)",
            summary.engine_result, summary.plies, summary.engine_nodes
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "self-play failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gametree_core::Error;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gametree"]).unwrap();
        assert_eq!(cli.game, GameKind::TicTacToe);
        assert_eq!(cli.opponent, Opponent::Random);
        assert_eq!(load_config(&cli).unwrap(), SearchConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "gametree",
            "othello",
            "--depth",
            "6",
            "--time-limit-ms",
            "250",
            "--opponent",
            "engine",
        ])
        .unwrap();
        assert_eq!(cli.game, GameKind::Othello);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.time_limit_ms, Some(250));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let cli = Cli::try_parse_from(["gametree", "ultimate", "-d", "0"]).unwrap();
        assert!(matches!(load_config(&cli), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_missing_config_file() {
        let cli =
            Cli::try_parse_from(["gametree", "--config", "/nonexistent/gametree.json"]).unwrap();
        assert!(matches!(load_config(&cli), Err(Error::Io(_))));
    }
}

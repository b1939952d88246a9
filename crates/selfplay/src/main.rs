//! Self-play and evaluation tool for the UCT searcher.
//!
//! Plays tic-tac-toe matches against a random or engine opponent and
//! generates recorded self-play games in MessagePack format.

mod arena;
mod record;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use arena::Opponent;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::info;
use uct_mcts::{Budget, SearchConfig};

/// UCT self-play and evaluation tool.
#[derive(Parser)]
#[command(name = "uct-selfplay")]
#[command(about = "Play and record tic-tac-toe games with the UCT searcher")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match and report the searcher's results.
    Play {
        /// Number of games to play; the searcher alternates sides.
        #[arg(short, long, default_value = "20")]
        games: usize,

        /// Opponent of the searcher.
        #[arg(long, value_enum, default_value = "random")]
        opponent: Opponent,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Generate self-play games.
    Generate {
        /// Number of games to generate.
        #[arg(short, long, default_value = "10")]
        games: usize,

        /// Output directory for game files.
        #[arg(short, long, default_value = "data/games")]
        output: PathBuf,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Opening moves chosen uniformly at random.
        #[arg(long, default_value = "2")]
        random_plies: usize,

        #[command(flatten)]
        search: SearchArgs,
    },
}

/// Search settings shared by all commands.
#[derive(Args, Debug)]
struct SearchArgs {
    /// JSON file with search parameters; missing fields take defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulations per move (overrides the config file).
    #[arg(short, long, conflicts_with = "time_ms")]
    simulations: Option<u32>,

    /// Milliseconds per move (overrides the config file).
    #[arg(long)]
    time_ms: Option<u64>,
}

impl SearchArgs {
    fn load(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => SearchConfig::with_simulations(1000),
        };
        if let Some(simulations) = self.simulations {
            config.budget = Budget::Simulations(simulations);
        }
        if let Some(ms) = self.time_ms {
            config.budget = Budget::TimeMillis(ms);
        }
        config.validate().context("Invalid search configuration")?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<SearchConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read config: {path:?}"))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse config: {path:?}"))
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

fn cmd_play(games: usize, opponent: Opponent, seed: u64, config: &SearchConfig) -> Result<()> {
    info!(games, ?opponent, seed, budget = ?config.budget, "starting match");
    let start = Instant::now();
    let tally = arena::play_match(config, opponent, games, seed)?;

    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!("================================================");
    println!("Searcher wins:   {}", tally.wins);
    println!("Searcher losses: {}", tally.losses);
    println!("Draws:           {}", tally.draws);
    println!("------------------------------------------------");
    println!("Score: {:.1}%", tally.score() * 100.0);
    Ok(())
}

fn cmd_generate(games: usize, output: &Path, seed: u64, random_plies: usize, config: &SearchConfig) -> Result<()> {
    info!(games, ?output, seed, random_plies, budget = ?config.budget, "generating games");
    let start = Instant::now();

    let records = (0..games)
        .into_par_iter()
        .map(|index| {
            let game_seed = seed.wrapping_add(index as u64 * 1000);
            record::generate_game(config, game_seed, random_plies)
                .with_context(|| format!("game {index} failed"))
        })
        .collect::<Result<Vec<_>>>()?;

    record::write_records(output, &records)?;

    let total_moves: usize = records.iter().map(|game| game.steps.len()).sum();
    let x_wins = records.iter().filter(|game| game.outcome > 0.5).count();
    let o_wins = records.iter().filter(|game| game.outcome < -0.5).count();
    let draws = records.len() - x_wins - o_wins;

    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!("Games generated: {games}");
    println!("Total moves: {total_moves}");
    if games > 0 {
        println!("Average game length: {:.1} moves", total_moves as f64 / games as f64);
    }
    println!("Files saved to: {output:?}");
    println!("\nOutcomes: X wins: {x_wins}, O wins: {o_wins}, Draws: {draws}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Play {
            games,
            opponent,
            seed,
            search,
        } => cmd_play(games, opponent, seed, &search.load()?),

        Commands::Generate {
            games,
            output,
            seed,
            random_plies,
            search,
        } => cmd_generate(games, &output, seed, random_plies, &search.load()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(config: Option<PathBuf>, simulations: Option<u32>, time_ms: Option<u64>) -> SearchArgs {
        SearchArgs {
            config,
            simulations,
            time_ms,
        }
    }

    #[test]
    fn test_cli_parses_play() {
        let cli = Cli::try_parse_from(["uct-selfplay", "play", "--games", "4", "--opponent", "engine", "-s", "50"])
            .unwrap();
        match cli.command {
            Commands::Play {
                games,
                opponent,
                search,
                ..
            } => {
                assert_eq!(games, 4);
                assert_eq!(opponent, Opponent::Engine);
                assert_eq!(search.simulations, Some(50));
            }
            Commands::Generate { .. } => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn test_cli_rejects_two_budgets() {
        let parsed = Cli::try_parse_from(["uct-selfplay", "play", "-s", "50", "--time-ms", "10"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_default_search_args() {
        let config = search_args(None, None, None).load().unwrap();
        assert_eq!(config.budget, Budget::Simulations(1000));
    }

    #[test]
    fn test_config_file_with_override() {
        let path = std::env::temp_dir().join(format!("uct-selfplay-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"rave": true, "exploration": 0.5}"#).unwrap();

        let config = search_args(Some(path.clone()), None, Some(25)).load().unwrap();
        fs::remove_file(&path).unwrap();

        assert!(config.rave);
        assert!((config.exploration - 0.5).abs() < 1e-9);
        assert_eq!(config.budget, Budget::TimeMillis(25));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let path = std::env::temp_dir().join(format!("uct-selfplay-bad-{}.json", std::process::id()));
        fs::write(&path, r#"{"regression_alpha": 2.0}"#).unwrap();

        let result = search_args(Some(path.clone()), None, None).load();
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
        assert!(read_config(Path::new("/nonexistent/config.json")).is_err());
    }
}

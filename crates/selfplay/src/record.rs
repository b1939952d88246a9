//! Recorded self-play games and their MessagePack files.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uct_core::{Board, Outcome, Player};
use uct_mcts::games::{Cell, TicTacToe};
use uct_mcts::{ChildReport, SearchConfig, Searcher};

/// Statistics of one root move.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VisitRow {
    /// Cell index 0-8.
    pub cell: u8,
    pub visits: u32,
    /// Mean credit for the player to move; infinite when proven.
    pub mean: f64,
    /// 1 or 2 when the move leads to a proven win for that player.
    pub proven_for: Option<u8>,
}

impl From<&ChildReport<Cell>> for VisitRow {
    fn from(row: &ChildReport<Cell>) -> Self {
        Self {
            cell: row.mv.0,
            visits: row.visits,
            mean: row.mean,
            proven_for: row.solved.map(player_number),
        }
    }
}

/// A single decision in a game.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GameStep {
    /// Position before the move, as accepted by `TicTacToe::from_cells`.
    pub position: String,

    /// Player to move: 1 (X) or 2 (O).
    pub player: u8,

    /// Cell played.
    pub action: u8,

    /// Simulations spent on the decision.
    pub simulations: u32,

    /// One row per legal move.
    pub visits: Vec<VisitRow>,
}

/// A complete game.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub steps: Vec<GameStep>,

    /// Game outcome: +1 (X wins), -1 (O wins), 0 (draw).
    pub outcome: f32,

    pub metadata: HashMap<String, serde_json::Value>,
}

fn player_number(player: Player) -> u8 {
    player.index() as u8 + 1
}

fn outcome_value(outcome: Outcome) -> f32 {
    match outcome.winner() {
        Some(Player::One) => 1.0,
        Some(Player::Two) => -1.0,
        None => 0.0,
    }
}

/// Let one searcher play both sides of a game.
///
/// The first `random_plies` moves are drawn uniformly so seeded games open
/// differently; they are still searched and recorded.
pub fn generate_game(config: &SearchConfig, seed: u64, random_plies: usize) -> Result<GameRecord> {
    let mut searcher = Searcher::new(config.clone(), ChaCha8Rng::seed_from_u64(seed))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut board = TicTacToe::new();
    let mut steps = Vec::new();

    while !board.outcome().is_over() {
        let report = searcher
            .search(&board)
            .with_context(|| format!("search failed at ply {}", steps.len()))?;

        let action = if steps.len() < random_plies {
            let moves = board.legal_moves(false);
            moves[rng.gen_range(0..moves.len())]
        } else {
            report.best_move
        };

        steps.push(GameStep {
            position: board.cells(),
            player: player_number(board.current_player()),
            action: action.0,
            simulations: report.simulations,
            visits: report.children.iter().map(VisitRow::from).collect(),
        });
        board.apply_move(action);
    }

    let mut metadata = HashMap::new();
    metadata.insert("seed".to_string(), serde_json::json!(seed));
    metadata.insert("moves".to_string(), serde_json::json!(steps.len()));
    metadata.insert("random_plies".to_string(), serde_json::json!(random_plies));
    metadata.insert("config".to_string(), serde_json::to_value(config)?);

    Ok(GameRecord {
        steps,
        outcome: outcome_value(board.outcome()),
        metadata,
    })
}

/// Path of game `index` inside `dir`.
pub fn record_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("game_{index:06}.msgpack"))
}

/// Write each record to its own MessagePack file in `dir`.
pub fn write_records(dir: &Path, records: &[GameRecord]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {dir:?}"))?;

    for (index, record) in records.iter().enumerate() {
        let path = record_path(dir, index);
        let file = File::create(&path).with_context(|| format!("Failed to create file: {path:?}"))?;
        let mut writer = BufWriter::new(file);
        // Named fields keep structs as maps, not arrays
        rmp_serde::encode::write_named(&mut writer, record)
            .with_context(|| format!("Failed to serialize game {index}"))?;
    }
    Ok(())
}

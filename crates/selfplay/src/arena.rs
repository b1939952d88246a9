//! Matches between the searcher and an opponent.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;
use uct_core::{Board, Outcome, Player};
use uct_mcts::games::TicTacToe;
use uct_mcts::{SearchConfig, Searcher};

/// Offset between the seeds of the two sides of a game.
const OPPONENT_SEED_OFFSET: u64 = 0x5eed;

/// Who the searcher plays against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Opponent {
    /// A second searcher with the same configuration and its own seed.
    Engine,
    /// Uniformly random legal moves.
    Random,
}

/// Results from the searcher's point of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl Tally {
    /// Count one finished game in which the searcher played `side`.
    pub fn record(&mut self, outcome: Outcome, side: Player) {
        match outcome.winner() {
            Some(winner) if winner == side => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    /// Points per game with a draw worth half a win.
    pub fn score(&self) -> f64 {
        if self.games() == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.draws as f64) / self.games() as f64
    }
}

/// The side the searcher takes in game `index`; sides alternate.
pub fn engine_side(index: usize) -> Player {
    if index % 2 == 0 {
        Player::One
    } else {
        Player::Two
    }
}

/// Play one game with the searcher on `side` and return the outcome.
pub fn play_game(config: &SearchConfig, opponent: Opponent, side: Player, seed: u64) -> Result<Outcome> {
    let mut engine = Searcher::new(config.clone(), ChaCha8Rng::seed_from_u64(seed))?;
    let opponent_seed = seed.wrapping_add(OPPONENT_SEED_OFFSET);
    let mut rival = match opponent {
        Opponent::Engine => Some(Searcher::new(config.clone(), ChaCha8Rng::seed_from_u64(opponent_seed))?),
        Opponent::Random => None,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(opponent_seed);
    let mut board = TicTacToe::new();

    while !board.outcome().is_over() {
        let mv = if board.current_player() == side {
            if let Some(rival) = rival.as_mut() {
                let _ = rival.observe_move();
            }
            engine.decide_move(&board).context("searcher failed to move")?
        } else {
            let _ = engine.observe_move();
            match rival.as_mut() {
                Some(rival) => rival.decide_move(&board).context("opponent failed to move")?,
                None => {
                    let moves = board.legal_moves(false);
                    moves[rng.gen_range(0..moves.len())]
                }
            }
        };
        board.apply_move(mv);
    }

    debug!(seed, %side, outcome = ?board.outcome(), "game finished");
    Ok(board.outcome())
}

/// Play `games` games in parallel; game `i` uses seed `seed + i`.
pub fn play_match(config: &SearchConfig, opponent: Opponent, games: usize, seed: u64) -> Result<Tally> {
    let results = (0..games)
        .into_par_iter()
        .map(|index| {
            let side = engine_side(index);
            let outcome = play_game(config, opponent, side, seed.wrapping_add(index as u64))
                .with_context(|| format!("game {index} failed"))?;
            Ok::<_, anyhow::Error>((outcome, side))
        })
        .collect::<Result<Vec<_>>>()?;

    let tally = results.into_iter().fold(Tally::default(), |mut tally, (outcome, side)| {
        tally.record(outcome, side);
        tally
    });
    Ok(tally)
}

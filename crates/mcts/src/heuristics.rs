//! Move statistics shared beyond a single tree node.
//!
//! - [`Average`]: weighted running mean used both for per-node RAVE
//!   accumulators and for the global move table.
//! - [`MoveAverages`]: global per-(player, move) averages of playout
//!   results, used to bias rollouts and, without RAVE, as the rapid
//!   action estimate during selection.

use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;
use uct_core::Player;

/// Value assumed for a move that has never been played in a rollout.
const UNSEEN_MOVE_VALUE: f64 = 1.0;

/// Weighted running mean.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Average {
    weight: f64,
    total: f64,
}

impl Average {
    /// Add `value` with the given sample weight.
    pub fn add(&mut self, value: f64, weight: f64) {
        self.weight += weight;
        self.total += value * weight;
    }

    /// Weighted mean, or `None` if nothing was added.
    pub fn mean(&self) -> Option<f64> {
        (self.weight > 0.0).then(|| self.total / self.weight)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Global per-move averages of playout credit.
#[derive(Clone, Debug)]
pub struct MoveAverages<M> {
    table: HashMap<(Player, M), Average>,
}

impl<M: Copy + Eq + Hash> MoveAverages<M> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Credit `value` to `mv` played by `player`.
    pub fn record(&mut self, player: Player, mv: M, value: f64) {
        self.table.entry((player, mv)).or_default().add(value, 1.0);
    }

    /// Average credit `player` earned after playing `mv`.
    pub fn mean(&self, player: Player, mv: M) -> Option<f64> {
        self.table.get(&(player, mv)).and_then(Average::mean)
    }

    /// Pick a playout move: uniformly at random with probability
    /// `epsilon`, otherwise the move with the best average (unseen moves
    /// count as `UNSEEN_MOVE_VALUE`, ties broken at random).
    ///
    /// # Panics
    /// Panics if `moves` is empty.
    pub fn choose<R: Rng>(&self, player: Player, moves: &[M], epsilon: f64, rng: &mut R) -> M {
        assert!(!moves.is_empty(), "BUG: choose called without moves");
        if rng.gen::<f64>() < epsilon {
            return moves[rng.gen_range(0..moves.len())];
        }

        let mut best = moves[0];
        let mut best_value = f64::NEG_INFINITY;
        for &mv in moves {
            let value = self.mean(player, mv).unwrap_or(UNSEEN_MOVE_VALUE) + rng.gen::<f64>() * 1e-6;
            if value > best_value {
                best_value = value;
                best = mv;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}

impl<M: Copy + Eq + Hash> Default for MoveAverages<M> {
    fn default() -> Self {
        Self::new()
    }
}

use std::fmt::Debug;
use std::hash::Hash;

use crate::{Outcome, Player};

/// A game position the search engine can explore.
///
/// This trait defines the capability any board must provide to be searched.
/// It is game-agnostic: tic-tac-toe, connect four, hex and other
/// two-player zero-sum games with perfect information all fit.
///
/// Boards are mutated in place by [`Board::apply_move`]; the engine clones
/// the board once per simulation, so `clone` must produce a deep,
/// independent copy.
pub trait Board: Clone {
    /// A game move (e.g., a cell index)
    type Move: Copy + Eq + Hash + Debug;

    /// Returns all legal moves from this position.
    ///
    /// When `for_playout` is true the board may return a reduced or
    /// reordered list tuned for fast playouts (e.g., dropping obviously bad
    /// moves). Returns an empty list once the game is over.
    fn legal_moves(&self, for_playout: bool) -> Vec<Self::Move>;

    /// Plays `mv` for the player to move. Legality is the board's concern.
    fn apply_move(&mut self, mv: Self::Move);

    /// Terminal status of the position.
    fn outcome(&self) -> Outcome;

    /// The player to move.
    fn current_player(&self) -> Player;

    /// Near-unique 64-bit identifier of the position (e.g., Zobrist hash).
    ///
    /// Two positions reached by different move orders must return the same
    /// fingerprint; distinct positions should not collide.
    fn fingerprint(&self) -> u64;

    /// Cheap heuristic value of the position for `player`; higher is better.
    ///
    /// Used only by implicit minimax and early playout termination.
    fn static_evaluation(&self, _player: Player) -> f64 {
        0.0
    }
}

//! Shared value types with enforced invariants.

use std::fmt;
use std::ops::Index;

/// One of the two sides of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    /// The side that moves first.
    One,
    /// The side that moves second.
    Two,
}

impl Player {
    /// Both players in turn order.
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    /// Get the opposing player.
    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Index of the player into per-player arrays.
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "player one"),
            Player::Two => write!(f, "player two"),
        }
    }
}

/// Terminal status of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The game continues.
    Ongoing,
    /// The given player has won.
    Win(Player),
    /// Neither player can win any more.
    Draw,
}

impl Outcome {
    /// Returns true if the game has ended.
    pub fn is_over(self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }

    /// The winner, if there is one.
    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::Win(player) => Some(player),
            _ => None,
        }
    }
}

/// Credit earned by each player from one simulated game.
///
/// Invariant: both entries lie in [0, 1] and sum to 1.0. A win is worth
/// 1.0, a loss 0.0 and a draw 0.5.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scores([f64; 2]);

impl Scores {
    /// Full credit to `winner`.
    pub fn win(winner: Player) -> Self {
        Self::scaled_win(winner, 1.0)
    }

    /// Full credit to the opponent of `loser`.
    pub fn loss(loser: Player) -> Self {
        Self::win(loser.opponent())
    }

    /// Even split.
    pub fn draw() -> Self {
        Self([0.5, 0.5])
    }

    /// `credit` to `player` and the remainder to the opponent.
    ///
    /// The credit is clamped into [0, 1] to keep the pair invariant.
    pub fn scaled_win(player: Player, credit: f64) -> Self {
        let credit = credit.clamp(0.0, 1.0);
        let mut scores = [0.0; 2];
        scores[player.index()] = credit;
        scores[player.opponent().index()] = 1.0 - credit;
        Self(scores)
    }

    /// Scores for a finished game; `None` while the game is ongoing.
    pub fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Ongoing => None,
            Outcome::Win(player) => Some(Self::win(player)),
            Outcome::Draw => Some(Self::draw()),
        }
    }
}

impl Index<Player> for Scores {
    type Output = f64;

    fn index(&self, player: Player) -> &f64 {
        &self.0[player.index()]
    }
}

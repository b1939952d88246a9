//! UCT Core - Board abstraction and common types
//!
//! This crate provides the `Board` trait that any two-player, perfect
//! information, zero-sum game implements to be searched by `uct_mcts`.
//!
//! # Types
//!
//! - [`Board`] - Trait for game implementations
//! - [`Player`] - One of the two sides
//! - [`Outcome`] - Terminal status of a position
//! - [`Scores`] - Per-player credit for a finished (or truncated) game

mod board;
mod error;
mod types;

pub use board::Board;
pub use error::{Result, UctError};
pub use types::{Outcome, Player, Scores};

//! Test boards for engine validation.
//!
//! These boards are used to verify search correctness; real games live in
//! their own crates.

pub mod tictactoe;

pub use tictactoe::{Cell, TicTacToe};

//! Monte Carlo Tree Search (UCT) with a shared transposition store.
//!
//! This crate provides a generic UCT search that can be used with any board
//! implementing the `uct_core::Board` trait.
//!
//! # Features
//!
//! - **Transpositions**: statistics are kept per position fingerprint, so
//!   every move order reaching a position shares one record
//! - **Memory reclamation**: records idle for a configurable number of real
//!   moves are evicted between decisions
//! - **Solver**: proven wins and losses propagate up the tree
//! - **Enhancements**: RAVE, move-average playouts, implicit minimax,
//!   linear-trend forecasting and early playout termination, each switched
//!   on in [`SearchConfig`]
//!
//! # Example
//!
//! ```
//! use uct_mcts::{games::TicTacToe, SearchConfig, Searcher};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let board = TicTacToe::new();
//! let config = SearchConfig::with_simulations(500);
//! let mut searcher = Searcher::new(config, ChaCha8Rng::seed_from_u64(42)).unwrap();
//!
//! let report = searcher.search(&board).unwrap();
//! println!("Best move: {}", report.best_move);
//! println!("Simulations: {}", report.simulations);
//! ```

pub mod config;
pub mod fastlog;
pub mod games;
pub mod heuristics;
pub mod node;
pub mod record;
pub mod search;
pub mod store;
mod tree;

pub use config::{Budget, SearchConfig};
pub use heuristics::{Average, MoveAverages};
pub use record::PositionRecord;
pub use search::{ChildReport, SearchReport, Searcher};
pub use store::{RecordId, StoreStats, TranspositionStore};

use thiserror::Error;

/// Errors that can occur in the UCT engine
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UctError {
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Game is already over")]
    GameOver,

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

/// Convenience Result type for UCT operations
pub type Result<T> = std::result::Result<T, UctError>;

//! Tic-tac-toe board for search validation.
//!
//! Tic-tac-toe is a solved game where perfect play always results in a draw.
//! This makes it ideal for validating the engine:
//! - The search should never lose against any opponent
//! - Two searchers should always draw
//! - The search should take forced wins and block forced losses
//!
//! X is [`Player::One`] and always moves first.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uct_core::{Board, Outcome, Player, Result, UctError};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // top row
    [3, 4, 5], // middle row
    [6, 7, 8], // bottom row
    [0, 3, 6], // left column
    [1, 4, 7], // center column
    [2, 5, 8], // right column
    [0, 4, 8], // main diagonal
    [2, 4, 6], // anti-diagonal
];

struct ZobristKeys {
    cells: [[u64; 2]; 9],
    side: u64,
}

static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = ChaCha8Rng::seed_from_u64(0x7ac7_ac70);
    let mut cells = [[0u64; 2]; 9];
    for cell in &mut cells {
        *cell = [rng.gen(), rng.gen()];
    }
    ZobristKeys {
        cells,
        side: rng.gen(),
    }
});

/// A tic-tac-toe move (cell index 0-8, row-major).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell(pub u8);

impl Cell {
    /// Get the row (0-2).
    pub fn row(self) -> u8 {
        self.0 / 3
    }

    /// Get the column (0-2).
    pub fn col(self) -> u8 {
        self.0 % 3
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row(), self.col())
    }
}

/// Tic-tac-toe board.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TicTacToe {
    /// Board: 9 cells, indexed 0-8 (row-major).
    /// ```text
    /// 0 | 1 | 2
    /// ---------
    /// 3 | 4 | 5
    /// ---------
    /// 6 | 7 | 8
    /// ```
    board: [Option<Player>; 9],

    /// Current player to move.
    current: Player,

    /// Cached winner (if any).
    winner: Option<Player>,

    /// Incrementally maintained Zobrist hash.
    hash: u64,
}

impl TicTacToe {
    /// Create a new empty board with X to move.
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current: Player::One,
            winner: None,
            hash: 0,
        }
    }

    /// Build a position from nine characters (`X`, `O` or `.`), row-major.
    /// Whitespace is ignored, so `"XO. .X. ..O"` is accepted.
    ///
    /// The player to move follows from the piece counts.
    ///
    /// # Errors
    /// Returns `UctError::InvalidPosition` for bad characters, a wrong cell
    /// count, impossible piece counts or two winners.
    pub fn from_cells(cells: &str) -> Result<Self> {
        let symbols: Vec<char> = cells.chars().filter(|c| !c.is_whitespace()).collect();
        if symbols.len() != 9 {
            return Err(UctError::InvalidPosition(format!(
                "expected 9 cells, got {}",
                symbols.len()
            )));
        }

        let mut position = Self::new();
        for (index, symbol) in symbols.into_iter().enumerate() {
            let piece = match symbol {
                'X' | 'x' => Some(Player::One),
                'O' | 'o' => Some(Player::Two),
                '.' | '_' | '-' => None,
                other => {
                    return Err(UctError::InvalidPosition(format!(
                        "unexpected cell symbol {other:?}"
                    )))
                }
            };
            if let Some(player) = piece {
                position.board[index] = Some(player);
                position.hash ^= ZOBRIST.cells[index][player.index()];
            }
        }

        let x = position.count(Player::One);
        let o = position.count(Player::Two);
        position.current = match x.checked_sub(o) {
            Some(0) => Player::One,
            Some(1) => Player::Two,
            _ => {
                return Err(UctError::InvalidPosition(format!(
                    "{x} X pieces against {o} O pieces"
                )))
            }
        };
        if position.current == Player::Two {
            position.hash ^= ZOBRIST.side;
        }

        let winners: Vec<Player> = Player::BOTH
            .into_iter()
            .filter(|&player| position.has_line(player))
            .collect();
        if winners.len() > 1 {
            return Err(UctError::InvalidPosition("both players have a line".to_string()));
        }
        position.winner = winners.first().copied();
        Ok(position)
    }

    /// Get the winner, if any.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Get the piece at a cell, if any.
    pub fn get(&self, cell: usize) -> Option<Player> {
        self.board.get(cell).copied().flatten()
    }

    /// Apply `cell` after checking it is playable.
    ///
    /// # Errors
    /// Returns `UctError::GameOver` once the game has ended and
    /// `UctError::InvalidMove` for a cell off the board or already taken.
    pub fn play(&mut self, cell: Cell) -> Result<()> {
        if self.outcome().is_over() {
            return Err(UctError::GameOver);
        }
        match self.board.get(cell.0 as usize) {
            None => Err(UctError::InvalidMove(format!("cell {} is off the board", cell.0))),
            Some(Some(_)) => Err(UctError::InvalidMove(format!("cell {cell} is occupied"))),
            Some(None) => {
                self.apply_move(cell);
                Ok(())
            }
        }
    }

    /// Compact row-major form accepted by [`TicTacToe::from_cells`].
    pub fn cells(&self) -> String {
        self.board
            .iter()
            .map(|cell| match cell {
                Some(Player::One) => 'X',
                Some(Player::Two) => 'O',
                None => '.',
            })
            .collect()
    }

    fn count(&self, player: Player) -> usize {
        self.board.iter().filter(|&&cell| cell == Some(player)).count()
    }

    fn has_line(&self, player: Player) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&cell| self.board[cell] == Some(player)))
    }

    /// Check if the board is full (draw if no winner).
    fn is_full(&self) -> bool {
        self.board.iter().all(|c| c.is_some())
    }

    fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(i, _)| Cell(i as u8))
    }

    /// Cells that complete a line for `player`.
    fn completing_cells(&self, player: Player) -> Vec<Cell> {
        self.empty_cells()
            .filter(|cell| {
                LINES.iter().any(|line| {
                    line.contains(&(cell.0 as usize))
                        && line
                            .iter()
                            .filter(|&&other| other != cell.0 as usize)
                            .all(|&other| self.board[other] == Some(player))
                })
            })
            .collect()
    }

    /// Lines `player` could still complete.
    fn open_lines(&self, player: Player) -> usize {
        LINES
            .iter()
            .filter(|line| {
                line.iter().all(|&cell| self.board[cell] != Some(player.opponent()))
                    && line.iter().any(|&cell| self.board[cell] == Some(player))
            })
            .count()
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TicTacToe {
    type Err = UctError;

    fn from_str(cells: &str) -> Result<Self> {
        Self::from_cells(cells)
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "-----------")?;
            }
            for col in 0..3 {
                if col > 0 {
                    write!(f, " | ")?;
                }
                let cell = row * 3 + col;
                match self.board[cell] {
                    Some(Player::One) => write!(f, " X ")?,
                    Some(Player::Two) => write!(f, " O ")?,
                    None => write!(f, "   ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Board for TicTacToe {
    type Move = Cell;

    /// Playout moves take an immediate win if there is one, otherwise
    /// block the opponent's immediate win if there is one.
    fn legal_moves(&self, for_playout: bool) -> Vec<Cell> {
        if self.winner.is_some() {
            return Vec::new();
        }
        if for_playout {
            let wins = self.completing_cells(self.current);
            if !wins.is_empty() {
                return wins;
            }
            let blocks = self.completing_cells(self.current.opponent());
            if !blocks.is_empty() {
                return blocks;
            }
        }
        self.empty_cells().collect()
    }

    fn apply_move(&mut self, mv: Cell) {
        let index = mv.0 as usize;
        debug_assert!(self.board[index].is_none(), "cell {mv} is occupied");
        self.board[index] = Some(self.current);
        self.hash ^= ZOBRIST.cells[index][self.current.index()] ^ ZOBRIST.side;
        if self.has_line(self.current) {
            self.winner = Some(self.current);
        }
        self.current = self.current.opponent();
    }

    fn outcome(&self) -> Outcome {
        match self.winner {
            Some(winner) => Outcome::Win(winner),
            None if self.is_full() => Outcome::Draw,
            None => Outcome::Ongoing,
        }
    }

    fn current_player(&self) -> Player {
        self.current
    }

    fn fingerprint(&self) -> u64 {
        self.hash
    }

    fn static_evaluation(&self, player: Player) -> f64 {
        match self.winner {
            Some(winner) if winner == player => 1.0,
            Some(_) => -1.0,
            None => {
                let own = self.open_lines(player) as f64;
                let theirs = self.open_lines(player.opponent()) as f64;
                (own - theirs) / LINES.len() as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(cells: &[u8]) -> TicTacToe {
        let mut board = TicTacToe::new();
        for &cell in cells {
            board.apply_move(Cell(cell));
        }
        board
    }

    #[test]
    fn test_initial_state() {
        let board = TicTacToe::new();

        assert_eq!(board.current_player(), Player::One);
        assert!(board.winner().is_none());
        assert_eq!(board.outcome(), Outcome::Ongoing);
        assert_eq!(board.legal_moves(false).len(), 9);
    }

    #[test]
    fn test_legal_moves_partial_board() {
        // Play X in center
        let board = play(&[4]);
        let moves = board.legal_moves(false);

        assert_eq!(moves.len(), 8);
        assert!(!moves.contains(&Cell(4)));
        assert_eq!(board.current_player(), Player::Two);
    }

    #[test]
    fn test_x_wins_top_row() {
        // X plays 0, 1, 2 (top row); O plays 3, 4
        let board = play(&[0, 3, 1, 4, 2]);

        assert_eq!(board.outcome(), Outcome::Win(Player::One));
        assert!(board.legal_moves(false).is_empty());
    }

    #[test]
    fn test_o_wins_diagonal() {
        // O plays 2, 4, 6 (anti-diagonal); X plays 0, 1, 3
        let board = play(&[0, 2, 1, 4, 3, 6]);
        assert_eq!(board.outcome(), Outcome::Win(Player::Two));
    }

    #[test]
    fn test_draw() {
        // Classic draw game:
        // X O X
        // X X O
        // O X O
        let board = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(board.outcome(), Outcome::Draw);
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let first = play(&[0, 4, 8]);
        let second = play(&[8, 4, 0]);
        assert_eq!(first.fingerprint(), second.fingerprint());

        let other = play(&[0, 8, 4]);
        assert_ne!(first.fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_from_cells_matches_played_position() {
        let played = play(&[0, 4, 8]);
        let parsed = TicTacToe::from_cells("X.. .O. ..X").unwrap();
        assert_eq!(parsed, played);
        assert_eq!(parsed.current_player(), Player::Two);
        assert_eq!(parsed.cells(), "X...O...X");
    }

    #[test]
    fn test_checked_play() {
        let mut board = TicTacToe::new();
        assert!(board.play(Cell(4)).is_ok());
        assert!(matches!(board.play(Cell(4)), Err(UctError::InvalidMove(_))));
        assert!(matches!(board.play(Cell(9)), Err(UctError::InvalidMove(_))));

        let mut won = play(&[0, 3, 1, 4, 2]);
        assert_eq!(won.play(Cell(8)), Err(UctError::GameOver));
    }

    #[test]
    fn test_from_cells_rejects_bad_input() {
        assert!(TicTacToe::from_cells("XX").is_err());
        assert!(TicTacToe::from_cells("XXX......").is_err());
        assert!(TicTacToe::from_cells("XQ.......").is_err());
        assert!(TicTacToe::from_cells("XXXOOO...").is_err());
        assert!("X........".parse::<TicTacToe>().is_ok());
    }

    #[test]
    fn test_playout_moves_prefer_wins_then_blocks() {
        // X X .
        // O O .
        // . . .
        let board = TicTacToe::from_cells("XX.OO....").unwrap();
        assert_eq!(board.legal_moves(true), vec![Cell(2)]);

        // X X .
        // O . .
        // . . .   O to move must block
        let board = TicTacToe::from_cells("XX.O.....").unwrap();
        assert_eq!(board.legal_moves(true), vec![Cell(2)]);
        assert_eq!(board.legal_moves(false).len(), 6);
    }

    #[test]
    fn test_static_evaluation() {
        let board = TicTacToe::new();
        assert_eq!(board.static_evaluation(Player::One), 0.0);

        let center = play(&[4]);
        assert!(center.static_evaluation(Player::One) > 0.0);
        assert!(center.static_evaluation(Player::Two) < 0.0);

        let won = play(&[0, 3, 1, 4, 2]);
        assert_eq!(won.static_evaluation(Player::One), 1.0);
        assert_eq!(won.static_evaluation(Player::Two), -1.0);
    }

    #[test]
    fn test_display() {
        let board = play(&[0, 4]);
        let display = format!("{}", board);
        assert!(display.contains('X'));
        assert!(display.contains('O'));
    }
}

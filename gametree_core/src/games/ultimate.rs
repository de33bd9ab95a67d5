#![allow(clippy::indexing_slicing)]
//! Recursive tic-tac-toe: a 3x3 grid of local boards. The cell a player
//! marks picks the local board the opponent must answer in; when that board
//! is already decided the opponent may play in any open board.

use crate::engine::{Evaluator, GameState, Outcome, Score};
use crate::error::{Error, Result};
use crate::games::tictactoe::{line_counts, line_winner, Mark, LINES};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UltimateMove {
    /// Local board, row-major `0..9`.
    pub board: u8,
    /// Cell inside the local board, row-major `0..9`.
    pub cell: u8,
}

impl UltimateMove {
    pub const fn new(board: u8, cell: u8) -> Self {
        Self { board, cell }
    }

    const fn index(self) -> usize {
        self.board as usize * 9 + self.cell as usize
    }
}

impl fmt::Display for UltimateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.board, self.cell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalStatus {
    Open,
    Won(Mark),
    Drawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UltimateTicTacToe {
    #[serde(with = "BigArray")]
    cells: [Option<Mark>; 81],
    boards: [LocalStatus; 9],
    /// Board the player to move is sent to, `None` for a free choice.
    active: Option<u8>,
    to_move: Mark,
}

impl Default for UltimateTicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl UltimateTicTacToe {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [None; 81],
            boards: [LocalStatus::Open; 9],
            active: None,
            to_move: Mark::X,
        }
    }

    pub fn cell(&self, mv: UltimateMove) -> Option<Mark> {
        self.cells.get(mv.index()).copied().flatten()
    }

    pub fn board_status(&self, board: u8) -> Option<LocalStatus> {
        self.boards.get(usize::from(board)).copied()
    }

    pub const fn active_board(&self) -> Option<u8> {
        self.active
    }

    fn local(&self, board: usize) -> [Option<Mark>; 9] {
        let mut cells = [None; 9];
        cells.copy_from_slice(&self.cells[board * 9..board * 9 + 9]);
        cells
    }

    fn macro_board(&self) -> [Option<Mark>; 9] {
        self.boards.map(|status| match status {
            LocalStatus::Won(mark) => Some(mark),
            _ => None,
        })
    }

    fn playable_boards(&self) -> Vec<usize> {
        match self.active {
            Some(board) if self.boards[usize::from(board)] == LocalStatus::Open => {
                vec![usize::from(board)]
            }
            _ => (0..9)
                .filter(|&b| self.boards[b] == LocalStatus::Open)
                .collect(),
        }
    }
}

impl GameState for UltimateTicTacToe {
    type Move = UltimateMove;
    type Player = Mark;

    const MAX_UTILITY: Score = 100;

    fn player_to_move(&self) -> Mark {
        self.to_move
    }

    fn outcome(&self) -> Option<Outcome<Mark>> {
        if let Some(winner) = line_winner(&self.macro_board()) {
            Some(Outcome::Win(winner))
        } else if self.boards.iter().all(|s| *s != LocalStatus::Open) {
            Some(Outcome::Draw)
        } else {
            None
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn legal_moves(&self) -> Vec<UltimateMove> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.playable_boards()
            .into_iter()
            .flat_map(|board| {
                (0..9)
                    .filter(move |&cell| self.cells[board * 9 + cell].is_none())
                    .map(move |cell| UltimateMove::new(board as u8, cell as u8))
            })
            .collect()
    }

    fn apply_move(&self, mv: &UltimateMove) -> Result<Self> {
        let illegal = |reason| Error::IllegalMove {
            mv: mv.to_string(),
            reason,
        };
        if mv.board >= 9 || mv.cell >= 9 {
            return Err(illegal("move is off the board"));
        }
        if self.is_terminal() {
            return Err(illegal("game is over"));
        }
        let board = usize::from(mv.board);
        if self.boards[board] != LocalStatus::Open {
            return Err(illegal("local board is already decided"));
        }
        if !self.playable_boards().contains(&board) {
            return Err(illegal("must play in the active board"));
        }
        if self.cells[mv.index()].is_some() {
            return Err(illegal("cell is occupied"));
        }

        let mut next = self.clone();
        next.cells[mv.index()] = Some(self.to_move);

        let local = next.local(board);
        next.boards[board] = if let Some(winner) = line_winner(&local) {
            LocalStatus::Won(winner)
        } else if local.iter().all(Option::is_some) {
            LocalStatus::Drawn
        } else {
            LocalStatus::Open
        };

        next.active = (next.boards[usize::from(mv.cell)] == LocalStatus::Open).then_some(mv.cell);
        next.to_move = self.to_move.opposite();
        Ok(next)
    }

    fn pass(&self) -> Self {
        let mut next = self.clone();
        next.to_move = self.to_move.opposite();
        next
    }
}

impl fmt::Display for UltimateTicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..9 {
            if row > 0 {
                f.write_str(if row % 3 == 0 { "\n---+---+---\n" } else { "\n" })?;
            }
            for col in 0..9 {
                if col > 0 && col % 3 == 0 {
                    f.write_str("|")?;
                }
                let board = (row / 3) * 3 + col / 3;
                let cell = (row % 3) * 3 + col % 3;
                let symbol = self.cells[board * 9 + cell].map_or('.', Mark::symbol);
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

const BOARD_WEIGHT: Score = 10;
const MARK_WEIGHT: Score = 1;
const THREAT_WEIGHT: Score = 3;

/// Decided boards weigh most; open boards add mark control and
/// two-in-a-row threats. The result stays inside `[-99, 99]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UltimateHeuristic;

impl UltimateHeuristic {
    fn local_score(cells: &[Option<Mark>; 9], me: Mark) -> Score {
        let marks: Score = cells
            .iter()
            .flatten()
            .map(|&mark| if mark == me { MARK_WEIGHT } else { -MARK_WEIGHT })
            .sum();
        let threats: Score = LINES
            .iter()
            .map(|&line| match line_counts(cells, line, me) {
                (2, 0) => THREAT_WEIGHT,
                (0, 2) => -THREAT_WEIGHT,
                _ => 0,
            })
            .sum();
        marks + threats
    }
}

impl Evaluator<UltimateTicTacToe> for UltimateHeuristic {
    fn evaluate(&self, state: &UltimateTicTacToe, perspective: Mark) -> Score {
        let bound = UltimateTicTacToe::MAX_UTILITY - 1;
        let score: Score = state
            .boards
            .iter()
            .enumerate()
            .map(|(board, status)| match status {
                LocalStatus::Won(mark) if *mark == perspective => BOARD_WEIGHT,
                LocalStatus::Won(_) => -BOARD_WEIGHT,
                LocalStatus::Drawn => 0,
                LocalStatus::Open => Self::local_score(&state.local(board), perspective),
            })
            .sum();
        score.clamp(-bound, bound)
    }
}

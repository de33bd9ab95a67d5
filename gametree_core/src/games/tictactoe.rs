#![allow(clippy::indexing_slicing)]

use crate::engine::{Evaluator, GameState, Outcome, Score};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Self::X => 'X',
            Self::O => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Rows, columns and diagonals of a 3x3 grid as row-major cell indices.
pub(crate) const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub(crate) fn line_winner(cells: &[Option<Mark>; 9]) -> Option<Mark> {
    LINES.iter().find_map(|&[a, b, c]| match (cells[a], cells[b], cells[c]) {
        (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
        _ => None,
    })
}

/// Own and opposing marks on one line.
pub(crate) fn line_counts(cells: &[Option<Mark>; 9], line: [usize; 3], me: Mark) -> (i32, i32) {
    line.iter().fold((0, 0), |(own, opp), &idx| match cells[idx] {
        Some(mark) if mark == me => (own + 1, opp),
        Some(_) => (own, opp + 1),
        None => (own, opp),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub const fn index(self) -> usize {
        self.row as usize * 3 + self.col as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(idx: usize) -> Self {
        Self {
            row: (idx / 3) as u8,
            col: (idx % 3) as u8,
        }
    }

    const fn is_valid(self) -> bool {
        self.row < 3 && self.col < 3
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicTacToe {
    cells: [Option<Mark>; 9],
    to_move: Mark,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    /// Empty board, X to move.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [None; 9],
            to_move: Mark::X,
        }
    }

    /// Reads a board written row by row with `X`, `O` and `.`. Whitespace
    /// and `/` separators are ignored.
    pub fn parse(input: &str, to_move: Mark) -> Result<Self> {
        let invalid = |reason| Error::InvalidPosition {
            input: input.to_string(),
            reason,
        };

        let mut cells = [None; 9];
        let mut count = 0;
        for ch in input.chars().filter(|c| !c.is_whitespace() && *c != '/') {
            let cell = match ch {
                'X' | 'x' => Some(Mark::X),
                'O' | 'o' => Some(Mark::O),
                '.' => None,
                _ => return Err(invalid("unexpected character")),
            };
            *cells.get_mut(count).ok_or_else(|| invalid("more than 9 cells"))? = cell;
            count += 1;
        }
        if count != 9 {
            return Err(invalid("expected 9 cells"));
        }

        Ok(Self { cells, to_move })
    }

    pub fn cell(&self, square: Square) -> Option<Mark> {
        self.cells.get(square.index()).copied().flatten()
    }

    #[cfg(test)]
    pub(crate) const fn cells(&self) -> &[Option<Mark>; 9] {
        &self.cells
    }
}

impl GameState for TicTacToe {
    type Move = Square;
    type Player = Mark;

    const MAX_UTILITY: Score = 100;

    fn player_to_move(&self) -> Mark {
        self.to_move
    }

    fn outcome(&self) -> Option<Outcome<Mark>> {
        if let Some(winner) = line_winner(&self.cells) {
            Some(Outcome::Win(winner))
        } else if self.cells.iter().all(Option::is_some) {
            Some(Outcome::Draw)
        } else {
            None
        }
    }

    fn legal_moves(&self) -> Vec<Square> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(idx, _)| Square::from_index(idx))
            .collect()
    }

    fn apply_move(&self, mv: &Square) -> Result<Self> {
        let illegal = |reason| Error::IllegalMove {
            mv: mv.to_string(),
            reason,
        };
        if !mv.is_valid() {
            return Err(illegal("square is off the board"));
        }
        if self.is_terminal() {
            return Err(illegal("game is over"));
        }
        if self.cells[mv.index()].is_some() {
            return Err(illegal("square is occupied"));
        }

        let mut next = self.clone();
        next.cells[mv.index()] = Some(self.to_move);
        next.to_move = self.to_move.opposite();
        Ok(next)
    }

    fn pass(&self) -> Self {
        Self {
            cells: self.cells,
            to_move: self.to_move.opposite(),
        }
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                f.write_str("/")?;
            }
            for cell in chunk {
                write!(f, "{}", cell.map_or('.', Mark::symbol))?;
            }
        }
        Ok(())
    }
}

/// Open-line count: every line not yet blocked scores `k²` for `k` marks,
/// positive for the perspective player and negative for the opponent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineHeuristic;

impl Evaluator<TicTacToe> for LineHeuristic {
    fn evaluate(&self, state: &TicTacToe, perspective: Mark) -> Score {
        LINES
            .iter()
            .map(|&line| match line_counts(&state.cells, line, perspective) {
                (own, 0) => own * own,
                (0, opp) => -opp * opp,
                _ => 0,
            })
            .sum()
    }
}

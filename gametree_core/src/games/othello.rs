#![allow(clippy::indexing_slicing)]

use crate::engine::{Evaluator, GameState, Outcome, Score};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use std::cmp::Ordering;
use std::fmt;

const SIZE: usize = 8;
const CELLS: usize = SIZE * SIZE;

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const CORNERS: [usize; 4] = [0, SIZE - 1, CELLS - SIZE, CELLS - 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Disc {
    Black,
    White,
}

impl Disc {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Self::Black => 'B',
            Self::White => 'W',
        }
    }
}

impl fmt::Display for Disc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    const fn index(self) -> usize {
        self.row as usize * SIZE + self.col as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn from_index(idx: usize) -> Self {
        Self {
            row: (idx / SIZE) as u8,
            col: (idx % SIZE) as u8,
        }
    }

    const fn is_valid(self) -> bool {
        (self.row as usize) < SIZE && (self.col as usize) < SIZE
    }
}

/// Algebraic notation, `a1` top left to `h8` bottom right.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'a'.saturating_add(self.col)),
            u16::from(self.row) + 1
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Othello {
    #[serde(with = "BigArray")]
    cells: [Option<Disc>; CELLS],
    to_move: Disc,
}

impl Default for Othello {
    fn default() -> Self {
        Self::new()
    }
}

impl Othello {
    /// Standard opening: four centre discs, black to move.
    #[must_use]
    pub fn new() -> Self {
        let mut cells = [None; CELLS];
        cells[Position::new(3, 3).index()] = Some(Disc::White);
        cells[Position::new(3, 4).index()] = Some(Disc::Black);
        cells[Position::new(4, 3).index()] = Some(Disc::Black);
        cells[Position::new(4, 4).index()] = Some(Disc::White);
        Self {
            cells,
            to_move: Disc::Black,
        }
    }

    /// Reads 64 cells row by row with `B`, `W` and `.`. Whitespace and `/`
    /// separators are ignored.
    pub fn parse(input: &str, to_move: Disc) -> Result<Self> {
        let invalid = |reason| Error::InvalidPosition {
            input: input.to_string(),
            reason,
        };

        let mut cells = [None; CELLS];
        let mut count = 0;
        for ch in input.chars().filter(|c| !c.is_whitespace() && *c != '/') {
            let cell = match ch {
                'B' | 'b' => Some(Disc::Black),
                'W' | 'w' => Some(Disc::White),
                '.' => None,
                _ => return Err(invalid("unexpected character")),
            };
            *cells.get_mut(count).ok_or_else(|| invalid("more than 64 cells"))? = cell;
            count += 1;
        }
        if count != CELLS {
            return Err(invalid("expected 64 cells"));
        }

        Ok(Self { cells, to_move })
    }

    pub fn disc(&self, pos: Position) -> Option<Disc> {
        self.cells.get(pos.index()).copied().flatten()
    }

    pub fn count(&self, disc: Disc) -> usize {
        self.cells.iter().filter(|c| **c == Some(disc)).count()
    }

    /// Opposing discs captured by `disc` playing on the empty cell `idx`.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn flips(&self, idx: usize, disc: Disc) -> Vec<usize> {
        let row = (idx / SIZE) as isize;
        let col = (idx % SIZE) as isize;
        let mut flipped = Vec::new();

        for (dr, dc) in DIRECTIONS {
            let mut run = Vec::new();
            let (mut r, mut c) = (row + dr, col + dc);
            while (0..SIZE as isize).contains(&r) && (0..SIZE as isize).contains(&c) {
                let at = r as usize * SIZE + c as usize;
                match self.cells[at] {
                    Some(d) if d == disc => {
                        flipped.append(&mut run);
                        break;
                    }
                    Some(_) => run.push(at),
                    None => break,
                }
                r += dr;
                c += dc;
            }
        }
        flipped
    }

    fn captures_any(&self, idx: usize, disc: Disc) -> bool {
        self.cells[idx].is_none() && !self.flips(idx, disc).is_empty()
    }

    /// Legal placements for `disc`, regardless of whose turn it is.
    pub fn moves_for(&self, disc: Disc) -> Vec<Position> {
        (0..CELLS)
            .filter(|&idx| self.captures_any(idx, disc))
            .map(Position::from_index)
            .collect()
    }

    fn has_move(&self, disc: Disc) -> bool {
        (0..CELLS).any(|idx| self.captures_any(idx, disc))
    }
}

impl GameState for Othello {
    type Move = Position;
    type Player = Disc;

    const MAX_UTILITY: Score = 1_000_000;

    fn player_to_move(&self) -> Disc {
        self.to_move
    }

    /// Over once neither side can place a disc; most discs wins.
    fn outcome(&self) -> Option<Outcome<Disc>> {
        if self.has_move(Disc::Black) || self.has_move(Disc::White) {
            return None;
        }
        Some(match self.count(Disc::Black).cmp(&self.count(Disc::White)) {
            Ordering::Greater => Outcome::Win(Disc::Black),
            Ordering::Less => Outcome::Win(Disc::White),
            Ordering::Equal => Outcome::Draw,
        })
    }

    fn legal_moves(&self) -> Vec<Position> {
        self.moves_for(self.to_move)
    }

    fn apply_move(&self, mv: &Position) -> Result<Self> {
        let illegal = |reason| Error::IllegalMove {
            mv: mv.to_string(),
            reason,
        };
        if !mv.is_valid() {
            return Err(illegal("square is off the board"));
        }
        let idx = mv.index();
        if self.cells[idx].is_some() {
            return Err(illegal("square is occupied"));
        }
        let flipped = self.flips(idx, self.to_move);
        if flipped.is_empty() {
            return Err(illegal("placement captures no discs"));
        }

        let mut next = self.clone();
        next.cells[idx] = Some(self.to_move);
        for at in flipped {
            next.cells[at] = Some(self.to_move);
        }
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

impl fmt::Display for Othello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(SIZE).enumerate() {
            if row > 0 {
                f.write_str("/")?;
            }
            for cell in chunk {
                write!(f, "{}", cell.map_or('.', Disc::symbol))?;
            }
        }
        Ok(())
    }
}

#[rustfmt::skip]
const POSITION_WEIGHTS: [Score; CELLS] = [
    100, -30,  15,  10,  10,  15, -30, 100,
    -30, -60,  -5,  -5,  -5,  -5, -60, -30,
     15,  -5,  15,   3,   3,  15,  -5,  15,
     10,  -5,   3,   3,   3,   3,  -5,  10,
     10,  -5,   3,   3,   3,   3,  -5,  10,
     15,  -5,  15,   3,   3,  15,  -5,  15,
    -30, -60,  -5,  -5,  -5,  -5, -60, -30,
    100, -30,  15,  10,  10,  15, -30, 100,
];

const EARLY_GAME_DISCS: usize = 20;
const LATE_GAME_DISCS: usize = 50;

/// Phase-weighted evaluation: mobility and corners early, a blend in the
/// middle game, disc count and corners at the end. The positional table
/// only separates positions the phase terms score equally.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseHeuristic;

impl PhaseHeuristic {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    const fn diff(a: usize, b: usize) -> Score {
        a as Score - b as Score
    }
}

impl Evaluator<Othello> for PhaseHeuristic {
    fn evaluate(&self, state: &Othello, perspective: Disc) -> Score {
        let opponent = perspective.opposite();

        let mut mine = 0;
        let mut theirs = 0;
        let mut positional = 0;
        for (idx, cell) in state.cells.iter().enumerate() {
            match cell {
                Some(d) if *d == perspective => {
                    mine += 1;
                    positional += POSITION_WEIGHTS[idx];
                }
                Some(_) => {
                    theirs += 1;
                    positional -= POSITION_WEIGHTS[idx];
                }
                None => {}
            }
        }
        let corners = CORNERS
            .iter()
            .map(|&idx| match state.cells[idx] {
                Some(d) if d == perspective => 1,
                Some(_) => -1,
                None => 0,
            })
            .sum::<Score>();

        let discs = Self::diff(mine, theirs);
        let total = mine + theirs;
        let primary = if total < EARLY_GAME_DISCS {
            let mobility = Self::diff(
                state.moves_for(perspective).len(),
                state.moves_for(opponent).len(),
            );
            8 * mobility + 100 * corners
        } else if total <= LATE_GAME_DISCS {
            let mobility = Self::diff(
                state.moves_for(perspective).len(),
                state.moves_for(opponent).len(),
            );
            6 * mobility + discs + 100 * corners
        } else {
            100 * discs + 100 * corners
        };

        primary * 100 + positional / 10
    }
}

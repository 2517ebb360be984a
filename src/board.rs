//! Game board: a flat grid of cell states indexed by `y * size + x`.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::common::BoardError;
use crate::config::BOARD_SIZE;
use crate::ship::Orientation;

/// State of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CellState {
    Empty = 0,
    Ship = 1,
    DamagedShip = 2,
    Miss = 3,
}

/// Convert a flat cell index to (x, y).
pub fn position_from_index(index: usize, size: usize) -> (usize, usize) {
    (index % size, index / size)
}

/// Convert (x, y) to a flat cell index.
pub fn index_from_position(x: usize, y: usize, size: usize) -> usize {
    y * size + x
}

/// One player's grid.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) size: usize,
    pub(crate) cells: Vec<CellState>,
}

impl Board {
    /// Create an empty standard-size board.
    pub fn new() -> Self {
        Self::with_size(BOARD_SIZE as usize)
    }

    /// Create an empty `size` x `size` board.
    pub fn with_size(size: usize) -> Self {
        Board {
            size,
            cells: vec![CellState::Empty; size * size],
        }
    }

    /// Build a board from raw cells, checking the length.
    pub fn from_cells(size: usize, cells: Vec<CellState>) -> Result<Self, BoardError> {
        let board = Board { size, cells };
        board.check_invariant()?;
        Ok(board)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// State at `index`, or `None` outside the board.
    pub fn cell(&self, index: usize) -> Option<CellState> {
        self.cells.get(index).copied()
    }

    pub fn set(&mut self, index: usize, state: CellState) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(BoardError::InvalidIndex(index))?;
        *cell = state;
        Ok(())
    }

    /// Number of cells currently in `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| **c == state).count()
    }

    /// Returns `true` while any undamaged ship cell remains.
    pub fn has_ship(&self) -> bool {
        self.cells.contains(&CellState::Ship)
    }

    /// Write `length` ship cells from `origin`, stepping along `orientation`.
    ///
    /// The caller guarantees the ship fits; cells past the edge are dropped.
    pub fn stamp_ship(&mut self, origin: usize, length: usize, orientation: Orientation) {
        let (mut x, mut y) = position_from_index(origin, self.size);
        for _ in 0..length {
            if x >= self.size || y >= self.size {
                break;
            }
            let index = index_from_position(x, y, self.size);
            if let Some(cell) = self.cells.get_mut(index) {
                *cell = CellState::Ship;
            }
            match orientation {
                Orientation::Horizontal => x += 1,
                Orientation::Vertical => y += 1,
            }
        }
    }

    /// Copy of the board with ship locations hidden from the opponent.
    pub fn sanitized_view(&self) -> Board {
        let cells = self
            .cells
            .iter()
            .map(|c| match c {
                CellState::Ship => CellState::Empty,
                other => *other,
            })
            .collect();
        Board {
            size: self.size,
            cells,
        }
    }

    /// Verify the cell storage still covers exactly `size * size` cells.
    pub fn check_invariant(&self) -> Result<(), BoardError> {
        let expected = self.size * self.size;
        if self.cells.len() != expected {
            return Err(BoardError::LengthMismatch {
                expected,
                found: self.cells.len(),
            });
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ size: {} }}", self.size)?;
        for row in self.cells.chunks(self.size.max(1)) {
            for cell in row {
                let c = match cell {
                    CellState::Empty => '.',
                    CellState::Ship => 'S',
                    CellState::DamagedShip => 'X',
                    CellState::Miss => 'o',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

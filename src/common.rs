//! Common error types for the game core.

use core::fmt;

/// Errors returned by Board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Cell index is outside the board.
    InvalidIndex(usize),
    /// Cell storage no longer matches `size * size`.
    LengthMismatch { expected: usize, found: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidIndex(i) => write!(f, "Cell index {} is out of range", i),
            BoardError::LengthMismatch { expected, found } => write!(
                f,
                "Board holds {} cells, expected {}",
                found, expected
            ),
        }
    }
}

/// Reasons a fleet placement is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetError {
    /// Placement does not contain one ship per fleet entry.
    WrongShipCount { expected: usize, found: usize },
    /// Ship at this position has a length the remaining fleet does not need.
    UnexpectedLength { ship: usize, length: usize },
    /// Ship at this position does not fit on the board.
    OutOfBounds { ship: usize },
    /// Two ships share at least one cell.
    Overlap { first: usize, second: usize },
    /// Random placement gave up.
    UnableToPlace,
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetError::WrongShipCount { expected, found } => {
                write!(f, "Expected {} ships, got {}", expected, found)
            }
            FleetError::UnexpectedLength { ship, length } => {
                write!(f, "Ship {} has unexpected length {}", ship, length)
            }
            FleetError::OutOfBounds { ship } => write!(f, "Ship {} is out of bounds", ship),
            FleetError::Overlap { first, second } => {
                write!(f, "Ships {} and {} overlap", first, second)
            }
            FleetError::UnableToPlace => write!(f, "Unable to place fleet"),
        }
    }
}

/// Errors surfaced by the match state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// Both slots are held by other identities.
    MatchFull,
    /// Internal state is inconsistent; the match has been aborted.
    InvariantViolation(BoardError),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::MatchFull => write!(f, "Match already has two players"),
            MatchError::InvariantViolation(e) => write!(f, "Match invariant violated: {}", e),
        }
    }
}

impl From<BoardError> for MatchError {
    fn from(err: BoardError) -> Self {
        MatchError::InvariantViolation(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
#[cfg(feature = "std")]
impl std::error::Error for FleetError {}
#[cfg(feature = "std")]
impl std::error::Error for MatchError {}

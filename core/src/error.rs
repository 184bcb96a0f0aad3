use alloc::string::String;
use thiserror::Error;

use crate::{CellCount, Coord};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(ConfigViolation),
    #[error("Cannot place {mines} mines, only {candidates} candidate cells are available")]
    UnsatisfiableConstraint {
        mines: CellCount,
        candidates: CellCount,
    },
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("A game is already running for this session")]
    SessionExists,
    #[error("No game is running for this session")]
    NoSession,
}

/// Which part of a board configuration was rejected, with the offending value.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("width {0} is outside 1..=30")]
    Width(Coord),
    #[error("height {0} is outside 1..=30")]
    Height(Coord),
    #[error("mine count {mines} must be between 1 and {cells} (exclusive)")]
    MineCount { mines: CellCount, cells: CellCount },
}

impl From<ConfigViolation> for GameError {
    fn from(violation: ConfigViolation) -> Self {
        Self::InvalidConfiguration(violation)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown difficulty {0:?}, expected one of easy, medium, hard")]
pub struct UnknownDifficulty(pub String);

pub type Result<T> = core::result::Result<T, GameError>;

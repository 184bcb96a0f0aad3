use serde::{Deserialize, Serialize};

/// What a cell holds once mines have been placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellContent {
    Empty,
    Number(u8),
    Mine,
}

impl CellContent {
    pub const fn from_adjacent(count: u8) -> Self {
        match count {
            0 => Self::Empty,
            n => Self::Number(n),
        }
    }

    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// How a renderer should draw a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    /// Flag left on a safe cell after the game was lost
    WrongFlag,
    Empty,
    Number(u8),
    Mine,
    /// The mine that ended the game
    Exploded,
}

impl CellView {
    // whether the cell is visually closed
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged | Self::WrongFlag)
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Hidden
    }
}

use crate::*;
pub use random::*;

mod random;

pub trait MinefieldGenerator {
    /// Places `config.mines()` mines, keeping `start` (and possibly its neighbors) clear.
    fn generate(&self, config: GameConfig, start: Coord2) -> Result<MineLayout>;
}

/// How much of the first revealed cell's surroundings is kept free of mines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartTile {
    /// Only the start cell itself is safe.
    SimpleSafe,
    /// The start cell and all of its neighbors are safe, so the opening shows a zero.
    ClearOpening,
}

impl StartTile {
    pub const fn excludes(self, start: Coord2, coords: Coord2) -> bool {
        match self {
            Self::SimpleSafe => start.0 == coords.0 && start.1 == coords.1,
            Self::ClearOpening => {
                start.0.abs_diff(coords.0) <= 1 && start.1.abs_diff(coords.1) <= 1
            }
        }
    }
}

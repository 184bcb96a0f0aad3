#![no_std]

extern crate alloc;

use alloc::string::ToString;
use core::ops::Index;
use core::str::FromStr;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use generator::*;
pub use session::*;
pub use snapshot::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
mod generator;
mod session;
mod snapshot;
mod tile;
mod types;

/// Largest accepted board side, in cells.
pub const MAX_SIDE: Coord = 30;

/// Board size and mine count, only constructible through validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct GameConfig {
    size: Coord2,
    mines: CellCount,
}

#[derive(Deserialize)]
struct RawConfig {
    size: Coord2,
    mines: CellCount,
}

impl TryFrom<RawConfig> for GameConfig {
    type Error = GameError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        Self::new(raw.size, raw.mines)
    }
}

impl GameConfig {
    pub(crate) const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validates `size` against `1..=MAX_SIDE` per axis and `mines` against `1..size.0 * size.1`.
    pub fn new((size_x, size_y): Coord2, mines: CellCount) -> Result<Self> {
        if !(1..=MAX_SIDE).contains(&size_x) {
            return Err(ConfigViolation::Width(size_x).into());
        }
        if !(1..=MAX_SIDE).contains(&size_y) {
            return Err(ConfigViolation::Height(size_y).into());
        }
        let cells = mult(size_x, size_y);
        if mines == 0 || mines >= cells {
            return Err(ConfigViolation::MineCount { mines, cells }.into());
        }
        Ok(Self::new_unchecked((size_x, size_y), mines))
    }

    pub const fn size(&self) -> Coord2 {
        self.size
    }

    pub const fn mines(&self) -> CellCount {
        self.mines
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mines
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Difficulty::default().config()
    }
}

/// Preset board sizes offered when starting a game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn config(self) -> GameConfig {
        match self {
            Self::Easy => GameConfig::new_unchecked((9, 9), 10),
            Self::Medium => GameConfig::new_unchecked((16, 16), 40),
            Self::Hard => GameConfig::new_unchecked((30, 16), 99),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("easy") || s == "简单" {
            Ok(Self::Easy)
        } else if s.eq_ignore_ascii_case("medium") || s == "普通" {
            Ok(Self::Medium)
        } else if s.eq_ignore_ascii_case("hard") || s == "困难" {
            Ok(Self::Hard)
        } else {
            Err(UnknownDifficulty(s.to_string()))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    size: Coord2,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        Ok(Self {
            mine_mask,
            size,
            mine_count,
        })
    }

    pub fn game_config(&self) -> Result<GameConfig> {
        GameConfig::new(self.size, self.mine_count)
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    /// Whether `coords` holds a mine, `false` off the board.
    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords).filter(|&pos| self[pos]).count() as u8
    }

    /// Mine positions in `(x, y)` order.
    pub fn mine_coords(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((x, y), _)| (x as Coord, y as Coord))
    }

    /// Content of every cell: mines, and the neighbor count everywhere else.
    pub fn contents(&self) -> Array2<CellContent> {
        Array2::from_shape_fn(self.size.to_nd_index(), |(x, y)| {
            let coords = (x as Coord, y as Coord);
            if self[coords] {
                CellContent::Mine
            } else {
                CellContent::from_adjacent(self.adjacent_mine_count(coords))
            }
        })
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size)
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        if in_bounds(coords, self.size) {
            &self.mine_mask[coords.to_nd_index()]
        } else {
            &false
        }
    }
}

/// Outcome of toggling a flag
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

/// Outcome of revealing a cell
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

use alloc::collections::BTreeSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Read-only copy of a board, everything a renderer needs to draw it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub size: Coord2,
    pub mine_count: CellCount,
    /// Cell contents, `None` until the first reveal placed the mines.
    pub grid: Option<Array2<CellContent>>,
    pub revealed: Array2<bool>,
    pub flagged: Array2<bool>,
    pub finished: bool,
    pub won: bool,
    pub mines: BTreeSet<Coord2>,
    pub exploded: Option<Coord2>,
}

impl Snapshot {
    pub fn from_board<G>(board: &Board<G>) -> Self {
        let minefield = board.minefield();
        Self {
            size: board.size(),
            mine_count: board.total_mines(),
            grid: minefield.map(|field| field.contents().clone()),
            revealed: board.revealed_mask().clone(),
            flagged: board.flagged_mask().clone(),
            finished: board.is_finished(),
            won: board.is_won(),
            mines: minefield
                .map(|field| field.layout().mine_coords().collect())
                .unwrap_or_default(),
            exploded: board.exploded_cell(),
        }
    }

    pub fn content_at(&self, coords: Coord2) -> Option<CellContent> {
        if !in_bounds(coords, self.size) {
            return None;
        }
        self.grid.as_ref().map(|grid| grid[coords.to_nd_index()])
    }

    /// Classifies a cell for drawing, `None` when out of bounds.
    pub fn cell_view(&self, coords: Coord2) -> Option<CellView> {
        use CellView::*;

        if !in_bounds(coords, self.size) {
            return None;
        }
        let index = coords.to_nd_index();
        let lost = self.finished && !self.won;

        Some(if self.flagged[index] {
            if lost && !self.mines.contains(&coords) {
                WrongFlag
            } else {
                Flagged
            }
        } else if !self.revealed[index] {
            Hidden
        } else if self.exploded == Some(coords) {
            Exploded
        } else {
            match self.content_at(coords) {
                Some(CellContent::Mine) => Mine,
                Some(CellContent::Number(count)) => Number(count),
                Some(CellContent::Empty) => Empty,
                None => Hidden,
            }
        })
    }

    /// Cell views for every cell, indexed `[x, y]`.
    pub fn cell_views(&self) -> Array2<CellView> {
        Array2::from_shape_fn(self.size.to_nd_index(), |(x, y)| {
            self.cell_view((x as Coord, y as Coord)).unwrap_or_default()
        })
    }
}

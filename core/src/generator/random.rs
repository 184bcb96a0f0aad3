use alloc::vec::Vec;

use super::*;

/// Generation strategy that tries to make the starting tile zero, falling back to merely safe, but other than that is
/// purely random.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    start_tile: StartTile,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, start_tile: StartTile) -> Self {
        Self { seed, start_tile }
    }

    fn candidates(config: GameConfig, start: Coord2, start_tile: StartTile) -> Vec<Coord2> {
        let (x_end, y_end) = config.size();
        (0..y_end)
            .flat_map(|y| (0..x_end).map(move |x| (x, y)))
            .filter(|&coords| !start_tile.excludes(start, coords))
            .collect()
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(&self, config: GameConfig, start: Coord2) -> Result<MineLayout> {
        use StartTile::*;
        use rand::{SeedableRng, rngs::SmallRng, seq::index};

        let wanted = usize::from(config.mines());

        let mut candidates = Self::candidates(config, start, self.start_tile);
        if candidates.len() < wanted && self.start_tile == ClearOpening {
            log::warn!(
                "Cannot keep the opening around {:?} clear, fallback to simple safe",
                start
            );
            candidates = Self::candidates(config, start, SimpleSafe);
        }
        if candidates.len() < wanted {
            log::error!(
                "Cannot place {} mines on a {:?} board, only {} candidates",
                config.mines(),
                config.size(),
                candidates.len()
            );
            return Err(GameError::UnsatisfiableConstraint {
                mines: config.mines(),
                candidates: candidates.len() as CellCount,
            });
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mines: Vec<Coord2> = index::sample(&mut rng, candidates.len(), wanted)
            .into_iter()
            .map(|i| candidates[i])
            .collect();

        log::debug!(
            "Placed {} mines on a {:?} board, start at {:?}",
            mines.len(),
            config.size(),
            start
        );
        MineLayout::from_mine_coords(config.size(), &mines)
    }
}

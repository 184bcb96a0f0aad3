use alloc::collections::VecDeque;
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No cell revealed yet, mines not placed
    Ready,
    Active,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Ready
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
enum Ending {
    Won,
    Lost { exploded: Coord2 },
}

/// Mines plus the per-cell content derived from them, fixed once placed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Minefield {
    layout: MineLayout,
    contents: Array2<CellContent>,
}

impl Minefield {
    fn new(layout: MineLayout) -> Self {
        let contents = layout.contents();
        Self { layout, contents }
    }

    pub(crate) fn layout(&self) -> &MineLayout {
        &self.layout
    }

    pub(crate) fn contents(&self) -> &Array2<CellContent> {
        &self.contents
    }

    fn content_at(&self, coords: Coord2) -> CellContent {
        self.contents[coords.to_nd_index()]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) enum Phase<G> {
    AwaitingFirstMove(G),
    Active(Minefield),
}

/// One game: owns the mines, the revealed and flagged masks, and the lifecycle.
///
/// `G` places the mines on the first reveal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Board<G = RandomMinefieldGenerator> {
    config: GameConfig,
    phase: Phase<G>,
    revealed: Array2<bool>,
    flagged: Array2<bool>,
    revealed_safe: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    ending: Option<Ending>,
}

impl Board {
    /// Board whose mines are placed on the first reveal, drawn from `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::with_generator(
            config,
            RandomMinefieldGenerator::new(seed, StartTile::ClearOpening),
        )
    }

    #[cfg(feature = "std")]
    pub fn with_entropy(config: GameConfig) -> Self {
        use rand::Rng;

        Self::new(config, rand::rng().random())
    }

    /// Board with mines already in place, skipping the first-move placement.
    pub fn from_layout(layout: MineLayout) -> Result<Self> {
        let config = layout.game_config()?;
        Ok(Self::blank(config, Phase::Active(Minefield::new(layout))))
    }
}

impl<G: MinefieldGenerator> Board<G> {
    pub fn with_generator(config: GameConfig, generator: G) -> Self {
        Self::blank(config, Phase::AwaitingFirstMove(generator))
    }

    /// Reveals a cell, placing the mines first if this is the opening move.
    ///
    /// Out-of-bounds, revealed or flagged cells and finished games give `NoChange`. The only error is a mine
    /// placement that cannot be satisfied, in which case the board is left untouched.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        if !self.can_interact_at(coords) || self.flagged[coords.to_nd_index()] {
            log::trace!("Ignoring reveal at {:?}", coords);
            return Ok(RevealOutcome::NoChange);
        }

        if let Phase::AwaitingFirstMove(generator) = &self.phase {
            let layout = generator.generate(self.config, coords)?;
            self.phase = Phase::Active(Minefield::new(layout));
        }

        Ok(self.reveal_single_cell(coords))
    }
}

impl<G> Board<G> {
    fn blank(config: GameConfig, phase: Phase<G>) -> Self {
        let shape = config.size().to_nd_index();
        Self {
            config,
            phase,
            revealed: Array2::default(shape),
            flagged: Array2::default(shape),
            revealed_safe: Saturating(0),
            flagged_count: Saturating(0),
            ending: None,
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines()
    }

    pub fn state(&self) -> EngineState {
        match (&self.phase, self.ending) {
            (_, Some(Ending::Won)) => EngineState::Won,
            (_, Some(Ending::Lost { .. })) => EngineState::Lost,
            (Phase::AwaitingFirstMove(_), None) => EngineState::Ready,
            (Phase::Active(_), None) => EngineState::Active,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ending.is_some()
    }

    pub fn is_won(&self) -> bool {
        matches!(self.ending, Some(Ending::Won))
    }

    pub fn exploded_cell(&self) -> Option<Coord2> {
        match self.ending {
            Some(Ending::Lost { exploded }) => Some(exploded),
            _ => None,
        }
    }

    pub fn mines_left(&self) -> isize {
        (self.config.mines() as isize) - (self.flagged_count.0 as isize)
    }

    pub fn revealed_safe_count(&self) -> CellCount {
        self.revealed_safe.0
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.config.size())
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.contains(coords) && self.revealed[coords.to_nd_index()]
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.contains(coords) && self.flagged[coords.to_nd_index()]
    }

    /// Content of a cell, `None` before mines are placed or out of bounds.
    pub fn content_at(&self, coords: Coord2) -> Option<CellContent> {
        match &self.phase {
            Phase::Active(field) if self.contains(coords) => Some(field.content_at(coords)),
            _ => None,
        }
    }

    pub fn mine_layout(&self) -> Option<&MineLayout> {
        self.minefield().map(Minefield::layout)
    }

    pub(crate) fn minefield(&self) -> Option<&Minefield> {
        match &self.phase {
            Phase::Active(field) => Some(field),
            Phase::AwaitingFirstMove(_) => None,
        }
    }

    pub(crate) fn revealed_mask(&self) -> &Array2<bool> {
        &self.revealed
    }

    pub(crate) fn flagged_mask(&self) -> &Array2<bool> {
        &self.flagged
    }

    pub fn can_interact_at(&self, coords: Coord2) -> bool {
        self.contains(coords) && !self.is_finished() && !self.revealed[coords.to_nd_index()]
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        if !self.can_interact_at(coords) {
            log::trace!("Ignoring flag at {:?}", coords);
            return MarkOutcome::NoChange;
        }

        let flag = &mut self.flagged[coords.to_nd_index()];
        *flag = !*flag;
        if *flag {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }
        log::debug!("Flag at {:?} set to {}", coords, self.flagged[coords.to_nd_index()]);

        self.check_won();
        MarkOutcome::Changed
    }

    fn reveal_single_cell(&mut self, coords: Coord2) -> RevealOutcome {
        let Phase::Active(field) = &self.phase else {
            return RevealOutcome::NoChange;
        };

        self.revealed[coords.to_nd_index()] = true;

        match field.content_at(coords) {
            CellContent::Mine => {
                for mine in field.layout.mine_coords() {
                    if !self.flagged[mine.to_nd_index()] {
                        self.revealed[mine.to_nd_index()] = true;
                    }
                }
                self.ending = Some(Ending::Lost { exploded: coords });
                log::debug!("Hit mine at {:?}, game lost", coords);
                return RevealOutcome::HitMine;
            }
            CellContent::Number(count) => {
                self.revealed_safe += 1;
                log::debug!("Revealed cell at {:?}, mine count: {}", coords, count);
            }
            CellContent::Empty => {
                self.revealed_safe += 1;
                let opened = flood_fill(field, &mut self.revealed, &self.flagged, coords);
                self.revealed_safe += opened;
                log::debug!("Flood-fill from {:?} opened {} more cells", coords, opened);
            }
        }

        if self.check_won() {
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    /// Ends the game as won once every safe cell is revealed, flagging the remaining mines.
    fn check_won(&mut self) -> bool {
        if self.is_finished() || self.revealed_safe.0 != self.config.safe_cell_count() {
            return false;
        }

        if let Phase::Active(field) = &self.phase {
            for mine in field.layout.mine_coords() {
                let flag = &mut self.flagged[mine.to_nd_index()];
                if !*flag {
                    *flag = true;
                    self.flagged_count += 1;
                }
            }
        }
        self.ending = Some(Ending::Won);
        log::debug!("All {} safe cells revealed, game won", self.revealed_safe.0);
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_board(self)
    }
}

/// Breadth-first expansion from an empty cell, using the revealed mask as the visited set.
///
/// Flagged cells are never opened and block expansion. Returns how many cells were newly revealed, not counting
/// `start` itself.
fn flood_fill(
    field: &Minefield,
    revealed: &mut Array2<bool>,
    flagged: &Array2<bool>,
    start: Coord2,
) -> CellCount {
    let mut opened = 0;
    let mut to_visit = VecDeque::from([start]);

    while let Some(visit_coords) = to_visit.pop_front() {
        for pos in field.layout.iter_neighbors(visit_coords) {
            let index = pos.to_nd_index();
            if revealed[index] || flagged[index] {
                continue;
            }

            revealed[index] = true;
            opened += 1;
            log::trace!("Flood opened cell at {:?}", pos);

            // if this is also zero we visit the neighbors
            if field.content_at(pos).is_empty() {
                to_visit.push_back(pos);
            }
        }
    }

    opened
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(size: Coord2, mines: &[Coord2]) -> MineLayout {
        MineLayout::from_mine_coords(size, mines).unwrap()
    }

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::from_layout(layout(size, mines)).unwrap()
    }

    /// Hands out a fixed layout regardless of where the game starts.
    #[derive(Clone, Debug, PartialEq)]
    struct FixedLayout(MineLayout);

    impl MinefieldGenerator for FixedLayout {
        fn generate(&self, _config: GameConfig, _start: Coord2) -> Result<MineLayout> {
            Ok(self.0.clone())
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Exhausted;

    impl MinefieldGenerator for Exhausted {
        fn generate(&self, config: GameConfig, _start: Coord2) -> Result<MineLayout> {
            Err(GameError::UnsatisfiableConstraint {
                mines: config.mines(),
                candidates: 0,
            })
        }
    }

    fn revealed_cells<G>(board: &Board<G>) -> usize {
        board.revealed.iter().filter(|&&r| r).count()
    }

    #[test]
    fn new_board_waits_for_first_move() {
        let board = Board::new(Difficulty::Easy.config(), 1);

        assert_eq!(board.state(), EngineState::Ready);
        assert!(board.mine_layout().is_none());
        assert_eq!(board.content_at((0, 0)), None);
        assert_eq!(revealed_cells(&board), 0);
    }

    #[test]
    fn first_reveal_places_mines_and_never_loses() {
        let config = GameConfig::new((9, 9), 10).unwrap();
        for seed in 0..64 {
            let mut board = Board::new(config, seed);

            let outcome = board.reveal((4, 4)).unwrap();

            assert_ne!(outcome, RevealOutcome::HitMine);
            assert_eq!(board.content_at((4, 4)), Some(CellContent::Empty));
            let layout = board.mine_layout().unwrap();
            assert_eq!(layout.mine_coords().count(), 10);
            for x in 3..=5 {
                for y in 3..=5 {
                    assert!(!layout.contains_mine((x, y)));
                    assert!(board.is_revealed((x, y)));
                }
            }
        }
    }

    #[test]
    fn mines_are_placed_only_once() {
        let mut board = Board::new(Difficulty::Medium.config(), 9);

        board.reveal((0, 0)).unwrap();
        let first = board.mine_layout().cloned();
        let next = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .find(|&pos| !board.is_revealed(pos) && board.content_at(pos) != Some(CellContent::Mine))
            .unwrap();
        board.reveal(next).unwrap();

        assert_eq!(board.mine_layout().cloned(), first);
    }

    #[test]
    fn degenerate_board_wins_on_first_reveal() {
        let mut board = Board::new(GameConfig::new((1, 2), 1).unwrap(), 3);

        assert_eq!(board.reveal((0, 1)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.state(), EngineState::Won);
        assert!(board.is_won());
        assert!(board.is_flagged((0, 0)));
        assert!(!board.is_revealed((0, 0)));
        assert_eq!(board.mines_left(), 0);
    }

    #[test]
    fn reveal_hits_mine_and_sets_exploded_cell() {
        let mut board = board((3, 3), &[(0, 0), (2, 2), (2, 0)]);
        board.toggle_flag((2, 2));

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(board.state(), EngineState::Lost);
        assert_eq!(board.exploded_cell(), Some((0, 0)));
        assert!(board.is_revealed((2, 0)));
        // flagged mines stay concealed
        assert!(!board.is_revealed((2, 2)));
        assert!(board.is_flagged((2, 2)));
        assert!(!board.is_revealed((1, 1)));
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut board = board((3, 3), &[(2, 2)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(board.content_at((0, 0)), Some(CellContent::Empty));
        assert_eq!(board.content_at((1, 1)), Some(CellContent::Number(1)));
        assert!(board.is_revealed((1, 1)));
        assert!(!board.is_revealed((2, 2)));
        assert!(board.is_flagged((2, 2)));
    }

    #[test]
    fn flood_fill_stops_at_numbers() {
        // column of mines at x = 3 splits the board
        let mut board = board((5, 3), &[(3, 0), (3, 1), (3, 2)]);

        assert_eq!(board.reveal((0, 1)).unwrap(), RevealOutcome::Revealed);

        for y in 0..3 {
            assert!(board.is_revealed((0, y)));
            assert!(board.is_revealed((1, y)));
            assert!(board.is_revealed((2, y)));
            assert!(!board.is_revealed((4, y)));
        }
        assert_eq!(board.revealed_safe_count(), 9);
    }

    #[test]
    fn flood_fill_does_not_cross_flags() {
        // flags across the whole middle column wall off the right side
        let mut board = board((5, 3), &[(4, 0)]);
        for y in 0..3 {
            board.toggle_flag((2, y));
        }

        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::Revealed);

        for y in 0..3 {
            assert!(board.is_revealed((0, y)));
            assert!(board.is_revealed((1, y)));
            assert!(!board.is_revealed((2, y)));
            assert!(!board.is_revealed((3, y)));
        }
        assert_eq!(board.revealed_safe_count(), 6);
        assert_eq!(revealed_cells(&board), 6);
    }

    #[test]
    fn two_adjacent_mines_show_number_two() {
        let mut board = board((3, 3), &[(0, 0), (2, 0)]);

        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::Revealed);

        assert_eq!(board.content_at((1, 0)), Some(CellContent::Number(2)));
        assert!(!board.is_revealed((1, 1)));
        assert_eq!(board.content_at((1, 1)), Some(CellContent::Number(2)));
    }

    #[test]
    fn flagged_cell_blocks_reveal() {
        let mut board = board((3, 3), &[(0, 0)]);

        assert_eq!(board.toggle_flag((2, 2)), MarkOutcome::Changed);
        assert_eq!(board.reveal((2, 2)).unwrap(), RevealOutcome::NoChange);
        assert!(!board.is_revealed((2, 2)));
    }

    #[test]
    fn already_revealed_and_out_of_bounds_are_no_change() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((1, 0)).unwrap();

        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.reveal((3, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.toggle_flag((1, 0)), MarkOutcome::NoChange);
        assert_eq!(board.toggle_flag((0, 9)), MarkOutcome::NoChange);
    }

    #[test]
    fn double_flag_toggle_restores_state() {
        let mut board = board((4, 4), &[(0, 0), (3, 3)]);
        board.reveal((1, 0)).unwrap();
        let before = board.clone();

        assert_eq!(board.toggle_flag((3, 3)), MarkOutcome::Changed);
        assert_eq!(board.mines_left(), 1);
        assert_eq!(board.toggle_flag((3, 3)), MarkOutcome::Changed);

        assert_eq!(board, before);
    }

    #[test]
    fn flagging_before_first_move_is_allowed() {
        let mut board = Board::new(Difficulty::Easy.config(), 5);

        assert_eq!(board.toggle_flag((8, 8)), MarkOutcome::Changed);
        assert_eq!(board.state(), EngineState::Ready);
        assert_eq!(board.mines_left(), 9);
    }

    #[test]
    fn flags_alone_do_not_win() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.toggle_flag((0, 0)), MarkOutcome::Changed);
        assert!(!board.is_finished());
    }

    #[test]
    fn finished_game_rejects_moves() {
        let mut board = board((3, 1), &[(0, 0)]);
        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::HitMine);

        assert_eq!(board.reveal((2, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.toggle_flag((1, 0)), MarkOutcome::NoChange);
        assert!(!board.is_revealed((2, 0)));
        assert!(!board.is_flagged((1, 0)));
    }

    #[test]
    fn winning_board_transitions_to_won_state() {
        let mut board = board((3, 1), &[(0, 0)]);

        assert_eq!(board.reveal((2, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.state(), EngineState::Won);
        assert_eq!(board.exploded_cell(), None);
        assert!(board.is_finished());
    }

    #[test]
    fn revealed_is_monotonic_over_a_game() {
        let mut board = Board::new(Difficulty::Easy.config(), 11);
        let mut previous = board.revealed.clone();

        'game: for y in 0..9 {
            for x in 0..9 {
                if board.is_finished() {
                    break 'game;
                }
                if board.content_at((x, y)) == Some(CellContent::Mine) {
                    continue;
                }
                board.reveal((x, y)).unwrap();
                for (was, now) in previous.iter().zip(board.revealed.iter()) {
                    assert!(!*was || *now);
                }
                previous = board.revealed.clone();
            }
        }

        assert!(board.is_won());
        assert_eq!(board.flagged_count.0, 10);
    }

    #[test]
    fn first_reveal_uses_the_board_generator() {
        let config = GameConfig::new((3, 3), 1).unwrap();
        let mut board = Board::with_generator(config, FixedLayout(layout((3, 3), &[(1, 1)])));
        assert_eq!(board.state(), EngineState::Ready);

        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::HitMine);
        assert_eq!(board.exploded_cell(), Some((1, 1)));
        assert_eq!(board.mine_layout(), Some(&layout((3, 3), &[(1, 1)])));
    }

    #[test]
    fn failed_placement_leaves_board_untouched() {
        let mut board = Board::with_generator(Difficulty::Easy.config(), Exhausted);
        board.toggle_flag((0, 0));
        let before = board.clone();

        assert_eq!(
            board.reveal((4, 4)),
            Err(GameError::UnsatisfiableConstraint {
                mines: 10,
                candidates: 0
            })
        );
        assert_eq!(board, before);
        assert_eq!(board.state(), EngineState::Ready);
    }

    #[test]
    fn board_from_deserialized_config_plays() {
        let config: GameConfig = serde_json::from_str(r#"{"size":[1,2],"mines":1}"#).unwrap();
        let mut board = Board::new(config, 0);

        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.revealed_safe_count(), 1);
    }
}

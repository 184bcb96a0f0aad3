use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::HashMap;

use crate::*;

/// Where live boards are kept, one per session key.
pub trait SessionStore<K> {
    fn get(&self, key: &K) -> Option<&Board>;
    fn get_mut(&mut self, key: &K) -> Option<&mut Board>;
    fn insert(&mut self, key: K, board: Board);
    fn remove(&mut self, key: &K) -> Option<Board>;
}

impl<K: Hash + Eq, S: BuildHasher> SessionStore<K> for HashMap<K, Board, S> {
    fn get(&self, key: &K) -> Option<&Board> {
        HashMap::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut Board> {
        HashMap::get_mut(self, key)
    }

    fn insert(&mut self, key: K, board: Board) {
        HashMap::insert(self, key, board);
    }

    fn remove(&mut self, key: &K) -> Option<Board> {
        HashMap::remove(self, key)
    }
}

/// Result of a move made through [`Sessions`], with the board as it looks afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn<O> {
    pub outcome: O,
    pub snapshot: Snapshot,
}

impl<O> Turn<O> {
    /// Whether the move ended the game, in which case the session was closed
    pub fn finished(&self) -> bool {
        self.snapshot.finished
    }
}

/// At most one running game per session key.
///
/// Finished games are dropped as soon as the move that ended them returns, so a new game can be started right away.
#[derive(Debug)]
pub struct Sessions<K, S = HashMap<K, Board>> {
    store: S,
    _key: PhantomData<fn(K)>,
}

impl<K, S: SessionStore<K> + Default> Default for Sessions<K, S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<K, S: SessionStore<K>> Sessions<K, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _key: PhantomData,
        }
    }

    pub fn start(&mut self, key: K, config: GameConfig, seed: u64) -> Result<Snapshot> {
        if self.store.get(&key).is_some() {
            return Err(GameError::SessionExists);
        }

        let board = Board::new(config, seed);
        let snapshot = board.snapshot();
        log::debug!(
            "Started {:?} game with {} mines",
            config.size(),
            config.mines()
        );
        self.store.insert(key, board);
        Ok(snapshot)
    }

    pub fn board(&self, key: &K) -> Option<&Board> {
        self.store.get(key)
    }

    pub fn reveal(&mut self, key: &K, coords: Coord2) -> Result<Turn<RevealOutcome>> {
        self.play(key, |board| board.reveal(coords))
    }

    pub fn flag(&mut self, key: &K, coords: Coord2) -> Result<Turn<MarkOutcome>> {
        self.play(key, |board| Ok(board.toggle_flag(coords)))
    }

    /// Ends the session's game early, handing back the board if there was one.
    pub fn abandon(&mut self, key: &K) -> Option<Board> {
        self.store.remove(key)
    }

    fn play<O>(
        &mut self,
        key: &K,
        action: impl FnOnce(&mut Board) -> Result<O>,
    ) -> Result<Turn<O>> {
        let board = self.store.get_mut(key).ok_or(GameError::NoSession)?;
        let outcome = action(board)?;
        let snapshot = board.snapshot();

        if snapshot.finished {
            log::debug!("Game finished, won: {}", snapshot.won);
            self.store.remove(key);
        }

        Ok(Turn { outcome, snapshot })
    }
}

/// Parses `"<column> <row>"`, both 1-based, into 0-based coordinates.
pub fn parse_coords(text: &str) -> Option<Coord2> {
    let mut parts = text.split_whitespace();
    let x = parse_one_based(parts.next()?)?;
    let y = parse_one_based(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((x, y))
}

// digits only, `u8::from_str` alone would also take a leading `+`
fn parse_one_based(token: &str) -> Option<Coord> {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<Coord>().ok()?.checked_sub(1)
}

use crate::core::config::EvictionPolicy;
use crate::core::geo::TileCoord;
use crate::prelude::Arc;
use crate::tiles::tile::Tile;
use crate::{MapError, Result};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Called with every tile the store drops to make room for a new one.
///
/// Runs after the store lock is released, so implementations may call back
/// into the store.
pub trait EvictionHook: Send + Sync {
    fn on_evict(&self, coord: TileCoord, tile: &Arc<Tile>);
}

impl<F> EvictionHook for F
where
    F: Fn(TileCoord, &Arc<Tile>) + Send + Sync,
{
    fn on_evict(&self, coord: TileCoord, tile: &Arc<Tile>) {
        self(coord, tile)
    }
}

/// Shared map of tile records keyed by coordinate.
///
/// Presence of a key means the coordinate is owned by some pipeline, not that
/// its content is ready: tiles are inserted as soon as they are reserved.
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct TileStore {
    tiles: Arc<Mutex<LruCache<TileCoord, Arc<Tile>>>>,
    eviction_hook: Option<Arc<dyn EvictionHook>>,
}

impl TileStore {
    pub fn new(policy: EvictionPolicy) -> Self {
        let cache = match policy {
            EvictionPolicy::Unbounded => LruCache::unbounded(),
            EvictionPolicy::Lru { capacity } => match NonZeroUsize::new(capacity) {
                Some(capacity) => LruCache::new(capacity),
                None => LruCache::unbounded(),
            },
        };
        Self {
            tiles: Arc::new(Mutex::new(cache)),
            eviction_hook: None,
        }
    }

    /// A store that never evicts
    pub fn unbounded() -> Self {
        Self::new(EvictionPolicy::Unbounded)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(EvictionPolicy::Lru { capacity })
    }

    pub fn with_eviction_hook(mut self, hook: Arc<dyn EvictionHook>) -> Self {
        self.eviction_hook = Some(hook);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<TileCoord, Arc<Tile>>> {
        self.tiles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get a tile, marking it as recently used
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Tile>> {
        self.lock().get(coord).cloned()
    }

    /// Get a tile without touching its recency
    pub fn peek(&self, coord: &TileCoord) -> Option<Arc<Tile>> {
        self.lock().peek(coord).cloned()
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.lock().contains(coord)
    }

    /// Inserts a tile under a coordinate nobody owns yet.
    ///
    /// Inserting over an existing entry is a caller bug and is rejected.
    pub fn put(&self, coord: TileCoord, tile: Arc<Tile>) -> Result<()> {
        debug_assert_eq!(coord, tile.coord());
        let evicted = {
            let mut tiles = self.lock();
            if tiles.contains(&coord) {
                return Err(MapError::TileReserved(coord));
            }
            tiles.push(coord, tile)
        };
        self.notify_evicted(evicted);
        Ok(())
    }

    /// Atomically creates and inserts a `Pending` tile for `coord`.
    ///
    /// Returns `None` when the coordinate is already owned.
    pub fn reserve(&self, coord: TileCoord) -> Option<Arc<Tile>> {
        self.reserve_with(coord, |_| {})
    }

    /// Like [`reserve`](Self::reserve), running `on_reserved` with the new
    /// tile before the store lock is released. Nothing can evict the tile
    /// before `on_reserved` returns. `on_reserved` must not call back into
    /// the store.
    pub fn reserve_with<F>(&self, coord: TileCoord, on_reserved: F) -> Option<Arc<Tile>>
    where
        F: FnOnce(&Arc<Tile>),
    {
        let (tile, evicted) = {
            let mut tiles = self.lock();
            if tiles.contains(&coord) {
                return None;
            }
            let tile = Arc::new(Tile::new(coord));
            on_reserved(&tile);
            let evicted = tiles.push(coord, tile.clone());
            (tile, evicted)
        };
        self.notify_evicted(evicted);
        Some(tile)
    }

    fn notify_evicted(&self, evicted: Option<(TileCoord, Arc<Tile>)>) {
        if let Some((coord, tile)) = evicted {
            log::debug!("evicted tile {} ({:?})", coord, tile.state());
            if let Some(hook) = &self.eviction_hook {
                hook.on_evict(coord, &tile);
            }
        }
    }

    /// Remove a tile from the store
    pub fn remove(&self, coord: &TileCoord) -> Option<Arc<Tile>> {
        self.lock().pop(coord)
    }

    /// Remove every tile, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut tiles = self.lock();
        let count = tiles.len();
        tiles.clear();
        count
    }

    /// Coordinates from `coords` that have no record yet, in input order.
    /// Coordinates that do have one are marked as recently used.
    pub fn missing(&self, coords: &[TileCoord]) -> Vec<TileCoord> {
        let mut tiles = self.lock();
        coords
            .iter()
            .filter(|coord| tiles.get(*coord).is_none())
            .copied()
            .collect()
    }

    pub fn coords(&self) -> Vec<TileCoord> {
        self.lock().iter().map(|(coord, _)| *coord).collect()
    }

    /// Get the current number of stored tiles
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of tiles, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        let cap = self.lock().cap().get();
        if cap == usize::MAX {
            None
        } else {
            Some(cap)
        }
    }
}

impl Default for TileStore {
    fn default() -> Self {
        Self::new(EvictionPolicy::Lru { capacity: 1024 })
    }
}

impl std::fmt::Debug for TileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tile_store_basic_operations() {
        let store = TileStore::unbounded();
        let coord1 = TileCoord::new(1, 2, 3);
        let coord2 = TileCoord::new(4, 5, 6);

        // Initially empty
        assert!(store.is_empty());
        assert_eq!(store.capacity(), None);

        store.put(coord1, Arc::new(Tile::new(coord1))).unwrap();
        assert!(store.contains(&coord1));
        assert_eq!(store.get(&coord1).map(|t| t.coord()), Some(coord1));

        let reserved = store.reserve(coord2).unwrap();
        assert_eq!(reserved.coord(), coord2);
        assert_eq!(store.len(), 2);

        assert_eq!(store.missing(&[coord1, TileCoord::new(0, 0, 0)]), vec![TileCoord::new(0, 0, 0)]);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_double_reservation_is_rejected() {
        let store = TileStore::unbounded();
        let coord = TileCoord::new(7, 7, 4);

        let first = store.reserve(coord).unwrap();
        assert!(store.reserve(coord).is_none());
        assert!(matches!(
            store.put(coord, Arc::new(Tile::new(coord))),
            Err(MapError::TileReserved(c)) if c == coord
        ));

        // the original record is untouched
        assert!(Arc::ptr_eq(&first, &store.get(&coord).unwrap()));
    }

    #[test]
    fn test_lru_eviction_calls_hook() {
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = evicted.clone();
        let store = TileStore::with_capacity(2).with_eviction_hook(Arc::new(
            move |coord: TileCoord, _tile: &Arc<Tile>| {
                assert_eq!(coord, TileCoord::new(1, 1, 1));
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));

        store.reserve(TileCoord::new(1, 1, 1)).unwrap();
        store.reserve(TileCoord::new(2, 2, 2)).unwrap();
        store.reserve(TileCoord::new(3, 3, 3)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.capacity(), Some(2));
        assert!(!store.contains(&TileCoord::new(1, 1, 1)));
        assert_eq!(evicted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let store = TileStore::with_capacity(2);
        let a = TileCoord::new(0, 0, 1);
        let b = TileCoord::new(1, 0, 1);
        store.reserve(a).unwrap();
        store.reserve(b).unwrap();

        store.get(&a);
        store.reserve(TileCoord::new(1, 1, 1)).unwrap();

        assert!(store.contains(&a));
        assert!(!store.contains(&b));
    }

    #[test]
    fn test_reserve_with_runs_before_eviction_hook() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hook_order = order.clone();
        let store = TileStore::with_capacity(1).with_eviction_hook(Arc::new(
            move |coord: TileCoord, _tile: &Arc<Tile>| {
                hook_order.lock().unwrap().push(format!("evict {}", coord));
            },
        ));
        let first = TileCoord::new(0, 0, 1);
        let second = TileCoord::new(1, 0, 1);

        store.reserve(first).unwrap();
        let tile = store
            .reserve_with(second, |tile| {
                order.lock().unwrap().push(format!("reserve {}", tile.coord()));
            })
            .unwrap();

        assert_eq!(tile.coord(), second);
        assert_eq!(
            *order.lock().unwrap(),
            vec![format!("reserve {}", second), format!("evict {}", first)]
        );
        // owned coordinates never run the callback
        assert!(store.reserve_with(second, |_| panic!("already owned")).is_none());
    }

    #[test]
    fn test_missing_keeps_selected_tiles_recent() {
        let store = TileStore::with_capacity(2);
        let a = TileCoord::new(0, 0, 1);
        let b = TileCoord::new(1, 0, 1);
        let c = TileCoord::new(1, 1, 1);
        store.reserve(a).unwrap();
        store.reserve(b).unwrap();

        assert_eq!(store.missing(&[a, c]), vec![c]);
        store.reserve(c).unwrap();

        assert!(store.contains(&a));
        assert!(!store.contains(&b));
    }

    #[test]
    fn test_concurrent_reservations_create_one_record() {
        let store = TileStore::unbounded();
        let coord = TileCoord::new(38742, 24829, 16);
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let winners = winners.clone();
                std::thread::spawn(move || {
                    if store.reserve(coord).is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }
}

//! Drives tiles from reservation to `Ready`/`Failed` and reports back to the
//! consumer thread.

use crate::core::config::PipelineOptions;
use crate::core::geo::TileCoord;
use crate::core::viewport::Viewport;
use crate::plugins::base::PluginContext;
use crate::plugins::layer::LayerPlugin;
use crate::plugins::parse::GeoJsonParsePlugin;
use crate::plugins::registry::{LayerSet, PluginRegistry};
use crate::plugins::scheduler::PluginScheduler;
use crate::plugins::vector_data::VectorDataPlugin;
use crate::prelude::{Arc, CancellationToken, HashMap};
use crate::runtime::{self, AsyncSpawner};
use crate::tiles::cache::TileStore;
use crate::tiles::data_source::TileDataSource;
use crate::tiles::selector::{SelectionMode, TileSelector};
use crate::tiles::tile::{Tile, TileState};
use crate::{MapError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Completion notification for one tile.
#[derive(Debug, Clone)]
pub enum TileEvent {
    Ready { coord: TileCoord, tile: Arc<Tile> },
    Failed { coord: TileCoord, error: Arc<MapError> },
}

impl TileEvent {
    pub fn coord(&self) -> TileCoord {
        match self {
            TileEvent::Ready { coord, .. } | TileEvent::Failed { coord, .. } => *coord,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TileEvent::Ready { .. })
    }
}

/// Receives tile notifications on the thread that calls
/// [`TileManager::dispatch_events`].
pub trait TileConsumer {
    fn on_tile_ready(&mut self, coord: TileCoord, tile: &Arc<Tile>);
    fn on_tile_failed(&mut self, coord: TileCoord, error: &Arc<MapError>);
}

/// A running pipeline, tied to the exact tile record it was started for.
struct Pipeline {
    id: u64,
    tile: Arc<Tile>,
    cancel: CancellationToken,
}

type InFlight = Arc<Mutex<HashMap<TileCoord, Pipeline>>>;

/// Owns the tile store and runs one plugin pipeline per reserved tile.
///
/// Pipelines run on the async runtime; results come back over a channel that
/// the consumer drains with [`try_recv_events`](Self::try_recv_events) or
/// [`dispatch_events`](Self::dispatch_events). Failed tiles stay in the store
/// until [`retry`](Self::retry) or [`evict`](Self::evict) is called.
pub struct TileManager {
    store: TileStore,
    scheduler: PluginScheduler,
    selector: TileSelector,
    spawner: Arc<dyn AsyncSpawner>,
    events_tx: Sender<TileEvent>,
    events_rx: Receiver<TileEvent>,
    in_flight: InFlight,
    next_pipeline: AtomicU64,
    shutdown: CancellationToken,
}

impl TileManager {
    pub fn new(registry: PluginRegistry, options: &PipelineOptions) -> Result<Self> {
        options.validate()?;

        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::default()));
        let hook_in_flight = in_flight.clone();
        let store = TileStore::new(options.cache.eviction).with_eviction_hook(Arc::new(
            move |coord: TileCoord, tile: &Arc<Tile>| {
                cancel_in_flight(&hook_in_flight, coord, tile);
            },
        ));

        let selector = match options.loading.range {
            Some(range) => TileSelector::new(SelectionMode::Range(range)),
            None => TileSelector::new(SelectionMode::Viewport),
        };
        let (events_tx, events_rx) = unbounded();

        Ok(Self {
            store,
            scheduler: PluginScheduler::new(Arc::new(registry)),
            selector,
            spawner: runtime::runtime(),
            events_tx,
            events_rx,
            in_flight,
            next_pipeline: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        })
    }

    /// `vector_data -> parse -> layer:{tag}` for every tag, fetching from the
    /// configured source over HTTP.
    pub fn with_default_pipeline<I, S>(options: &PipelineOptions, layer_tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let layers = LayerSet::from_tags(layer_tags);
        let data_source = TileDataSource::from_options(options, layers);
        let registry = default_registry(data_source)?;
        Self::new(registry, options)
    }

    /// Spawn pipelines through `spawner` instead of the global runtime.
    pub fn with_spawner(mut self, spawner: Arc<dyn AsyncSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_selector(mut self, selector: TileSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        self.scheduler.registry()
    }

    pub fn selector(&self) -> &TileSelector {
        &self.selector
    }

    pub fn tile(&self, coord: &TileCoord) -> Option<Arc<Tile>> {
        self.store.get(coord)
    }

    /// Number of pipelines still running
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Requests every tile the viewport needs that is not owned yet, center
    /// tile first. Returns the coordinates that were newly reserved.
    pub fn update_viewport(&self, viewport: &Viewport) -> Vec<TileCoord> {
        let mut missing = self.selector.missing(viewport, &self.store);
        let center = viewport.center_tile();
        missing.sort_by_key(|coord| {
            let dx = coord.x as i64 - center.x as i64;
            let dy = coord.y as i64 - center.y as i64;
            dx * dx + dy * dy
        });
        self.request_tiles(&missing)
    }

    /// Reserves the given coordinates and starts their pipelines.
    ///
    /// Everything is reserved before the first pipeline is spawned, so a
    /// concurrent update never requests the same tiles again. Coordinates
    /// that are already owned or invalid are skipped. A bounded store never
    /// takes more than its capacity in one request, so a batch cannot evict
    /// its own tiles.
    pub fn request_tiles(&self, coords: &[TileCoord]) -> Vec<TileCoord> {
        if self.shutdown.is_cancelled() {
            log::warn!("tile manager is shut down; ignoring {} tile requests", coords.len());
            return Vec::new();
        }

        let mut valid: Vec<TileCoord> = coords
            .iter()
            .filter(|coord| {
                let valid = coord.is_valid();
                if !valid {
                    log::warn!("skipping invalid tile coordinate {}", coord);
                }
                valid
            })
            .copied()
            .collect();
        if let Some(capacity) = self.store.capacity() {
            if valid.len() > capacity {
                log::warn!(
                    "{} tiles requested but the store holds {}; dropping the rest",
                    valid.len(),
                    capacity
                );
                valid.truncate(capacity);
            }
        }

        // the pipeline is registered while the reservation is still locked,
        // so any later eviction finds its token
        let reserved: Vec<(Arc<Tile>, u64, CancellationToken)> = valid
            .into_iter()
            .filter_map(|coord| {
                let mut registration = None;
                let tile = self.store.reserve_with(coord, |tile| {
                    registration = Some(self.register_pipeline(tile));
                })?;
                let (id, cancel) = registration?;
                Some((tile, id, cancel))
            })
            .collect();

        if !reserved.is_empty() {
            log::debug!("reserved {} tiles", reserved.len());
        }
        reserved
            .into_iter()
            .filter_map(|(tile, id, cancel)| {
                let coord = tile.coord();
                self.spawn_pipeline(tile, id, cancel).then_some(coord)
            })
            .collect()
    }

    fn register_pipeline(&self, tile: &Arc<Tile>) -> (u64, CancellationToken) {
        let id = self.next_pipeline.fetch_add(1, Ordering::Relaxed);
        let cancel = self.shutdown.child_token();
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                tile.coord(),
                Pipeline {
                    id,
                    tile: tile.clone(),
                    cancel: cancel.clone(),
                },
            );
        (id, cancel)
    }

    /// Starts the registered pipeline of a reserved tile. Returns `false`
    /// when the tile was evicted before it could start.
    fn spawn_pipeline(&self, tile: Arc<Tile>, id: u64, cancel: CancellationToken) -> bool {
        let coord = tile.coord();
        if !holds(&self.store, &tile) {
            log::debug!("tile {} evicted before its pipeline started", coord);
            release_in_flight(&self.in_flight, coord, id);
            return false;
        }

        let scheduler = self.scheduler.clone();
        let store = self.store.clone();
        let events = self.events_tx.clone();
        let in_flight = self.in_flight.clone();

        self.spawner.spawn_boxed(Box::pin(async move {
            let ctx = PluginContext::new(tile.clone(), cancel);
            let outcome = drive_tile(&scheduler, &ctx).await;
            release_in_flight(&in_flight, coord, id);

            let event = match outcome {
                Ok(()) => match tile.advance(TileState::Ready) {
                    Ok(()) => {
                        log::info!("tile {} ready", coord);
                        TileEvent::Ready {
                            coord,
                            tile: tile.clone(),
                        }
                    }
                    Err(e) => TileEvent::Failed {
                        coord,
                        error: Arc::new(e),
                    },
                },
                Err(error) if matches!(*error, MapError::Cancelled) => {
                    log::debug!("tile {} pipeline cancelled", coord);
                    let _ = tile.fail(error);
                    return;
                }
                Err(error) => {
                    log::warn!("tile {} failed: {}", coord, error);
                    if let Err(e) = tile.fail(error.clone()) {
                        log::error!("could not mark tile {} failed: {}", coord, e);
                    }
                    TileEvent::Failed { coord, error }
                }
            };

            if !holds(&store, &tile) {
                log::debug!("tile {} was evicted; dropping its result", coord);
                return;
            }
            if events.send(event).is_err() {
                log::debug!("tile manager dropped before tile {} finished", coord);
            }
        }));
        true
    }

    /// Discards a failed tile and requests it again. Returns `false` when the
    /// tile is missing or not `Failed`.
    pub fn retry(&self, coord: TileCoord) -> bool {
        match self.store.peek(&coord) {
            Some(tile) if tile.state() == TileState::Failed => {
                self.store.remove(&coord);
                log::info!("retrying tile {}", coord);
                !self.request_tiles(&[coord]).is_empty()
            }
            _ => false,
        }
    }

    /// Removes a tile and cancels its pipeline if it is still running.
    pub fn evict(&self, coord: TileCoord) -> Option<Arc<Tile>> {
        let tile = self.store.remove(&coord)?;
        cancel_in_flight(&self.in_flight, coord, &tile);
        Some(tile)
    }

    /// Evicts every tile, e.g. after a zoom reset.
    pub fn clear(&self) -> usize {
        let cancelled: Vec<_> = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .collect();
        for (_, pipeline) in cancelled {
            pipeline.cancel.cancel();
        }
        self.store.clear()
    }

    /// Cancels every pipeline and refuses new requests.
    pub fn shutdown(&self) {
        log::debug!("tile manager shutting down ({} in flight)", self.in_flight());
        self.shutdown.cancel();
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Drains pending notifications without blocking.
    pub fn try_recv_events(&self) -> Vec<TileEvent> {
        self.events_rx.try_iter().collect()
    }

    /// Waits up to `timeout` for the next notification.
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<TileEvent> {
        self.events_rx.recv_timeout(timeout).ok()
    }

    /// Hands every pending notification to `consumer`, returning how many
    /// were delivered.
    pub fn dispatch_events(&self, consumer: &mut dyn TileConsumer) -> usize {
        let mut delivered = 0;
        for event in self.events_rx.try_iter() {
            match &event {
                TileEvent::Ready { coord, tile } => consumer.on_tile_ready(*coord, tile),
                TileEvent::Failed { coord, error } => consumer.on_tile_failed(*coord, error),
            }
            delivered += 1;
        }
        delivered
    }
}

impl Drop for TileManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("store", &self.store)
            .field("registry", self.scheduler.registry())
            .field("selector", &self.selector)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Registry for the standard pipeline over `data_source`.
pub fn default_registry(data_source: TileDataSource) -> Result<PluginRegistry> {
    let layers = data_source.layers().clone();
    let mut builder = PluginRegistry::builder()
        .register(VectorDataPlugin::new(data_source))
        .register(GeoJsonParsePlugin::for_layers(&layers));
    for tag in layers.tags() {
        builder = builder.register(LayerPlugin::new(tag.clone()));
    }
    builder.build()
}

async fn drive_tile(
    scheduler: &PluginScheduler,
    ctx: &PluginContext,
) -> std::result::Result<(), Arc<MapError>> {
    ctx.tile().advance(TileState::Loading).map_err(Arc::new)?;
    let run = scheduler.run(ctx).await.map_err(Arc::new)?;
    if run.is_success() {
        return Ok(());
    }
    Err(run.first_error().unwrap_or_else(|| {
        Arc::new(MapError::Plugin(format!(
            "tile {} finished without completing every plugin",
            ctx.coord()
        )))
    }))
}

/// Whether `tile` is still the store's record for its coordinate.
fn holds(store: &TileStore, tile: &Arc<Tile>) -> bool {
    store
        .peek(&tile.coord())
        .map_or(false, |current| Arc::ptr_eq(&current, tile))
}

fn release_in_flight(in_flight: &InFlight, coord: TileCoord, id: u64) {
    let mut in_flight = in_flight.lock().unwrap_or_else(|e| e.into_inner());
    if matches!(in_flight.get(&coord), Some(pipeline) if pipeline.id == id) {
        in_flight.remove(&coord);
    }
}

/// Cancels the pipeline running for `tile`, if any.
fn cancel_in_flight(in_flight: &InFlight, coord: TileCoord, tile: &Arc<Tile>) {
    let pipeline = {
        let mut in_flight = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        match in_flight.get(&coord) {
            Some(pipeline) if Arc::ptr_eq(&pipeline.tile, tile) => in_flight.remove(&coord),
            _ => None,
        }
    };
    if let Some(pipeline) = pipeline {
        log::debug!("cancelling pipeline of tile {}", coord);
        pipeline.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EvictionPolicy;
    use crate::plugins::base::{FnPlugin, PluginTrait};
    use futures::future::BoxFuture;

    fn options(range: Option<u32>) -> PipelineOptions {
        let mut options = PipelineOptions::default();
        options.loading.range = range;
        options.cache.eviction = EvictionPolicy::Unbounded;
        options
    }

    fn stage(name: &str, fail_on: Option<TileCoord>) -> Arc<dyn PluginTrait> {
        let output = name.to_string();
        Arc::new(FnPlugin::new(name, Vec::<String>::new(), move |ctx: PluginContext| {
            let output = output.clone();
            Box::pin(async move {
                if Some(ctx.coord()) == fail_on {
                    return Err(MapError::Plugin("boom".to_string()));
                }
                ctx.tile().set_output(&output, serde_json::json!(ctx.coord().x))
            }) as BoxFuture<'static, Result<()>>
        }))
    }

    async fn collect(manager: &TileManager, count: usize) -> Vec<TileEvent> {
        let mut events = Vec::new();
        for _ in 0..500 {
            events.extend(manager.try_recv_events());
            if events.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        events
    }

    #[derive(Default)]
    struct Recorder {
        ready: Vec<TileCoord>,
        failed: Vec<TileCoord>,
    }

    impl TileConsumer for Recorder {
        fn on_tile_ready(&mut self, coord: TileCoord, tile: &Arc<Tile>) {
            assert!(tile.is_ready());
            self.ready.push(coord);
        }

        fn on_tile_failed(&mut self, coord: TileCoord, _error: &Arc<MapError>) {
            self.failed.push(coord);
        }
    }

    #[tokio::test]
    async fn test_viewport_update_loads_tiles() {
        let registry = PluginRegistry::new(vec![stage("content", None)]).unwrap();
        let manager = TileManager::new(registry, &options(Some(1))).unwrap();

        let requested = manager.update_viewport(&Viewport::default());
        assert_eq!(requested.len(), 9);
        assert_eq!(manager.store().len(), 9);

        // nothing new on a second pass
        assert!(manager.update_viewport(&Viewport::default()).is_empty());

        let events = collect(&manager, 9).await;
        assert_eq!(events.len(), 9);
        assert!(events.iter().all(TileEvent::is_ready));
        for coord in requested {
            let tile = manager.tile(&coord).unwrap();
            assert_eq!(tile.state(), TileState::Ready);
            assert_eq!(tile.output("content").as_deref(), Some(&serde_json::json!(coord.x)));
        }
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failed_tile_stays_reserved_until_retry() {
        let bad = TileCoord::new(10, 20, 16);
        let registry = PluginRegistry::new(vec![stage("content", Some(bad))]).unwrap();
        let manager = TileManager::new(registry, &options(Some(0))).unwrap();

        assert_eq!(manager.request_tiles(&[bad]), vec![bad]);
        let events = collect(&manager, 1).await;
        assert!(matches!(&events[..], [TileEvent::Failed { coord, .. }] if *coord == bad));

        let tile = manager.tile(&bad).unwrap();
        assert_eq!(tile.state(), TileState::Failed);
        assert!(tile.error().is_some());
        assert!(manager.request_tiles(&[bad]).is_empty());

        assert!(manager.retry(bad));
        let events = collect(&manager, 1).await;
        assert_eq!(events.len(), 1);
        assert!(!manager.retry(TileCoord::new(1, 1, 16)));
    }

    #[tokio::test]
    async fn test_dispatch_to_consumer() {
        let bad = TileCoord::new(1, 0, 1);
        let registry = PluginRegistry::new(vec![stage("content", Some(bad))]).unwrap();
        let manager = TileManager::new(registry, &options(Some(0))).unwrap();

        manager.request_tiles(&[TileCoord::new(0, 0, 1), bad, TileCoord::new(9, 9, 1)]);
        for _ in 0..500 {
            if manager.in_flight() == 0 && manager.events_rx.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut recorder = Recorder::default();
        assert_eq!(manager.dispatch_events(&mut recorder), 2);
        assert_eq!(recorder.ready, vec![TileCoord::new(0, 0, 1)]);
        assert_eq!(recorder.failed, vec![bad]);
        // out-of-grid coordinate was never reserved
        assert!(!manager.store().contains(&TileCoord::new(9, 9, 1)));
    }

    #[tokio::test]
    async fn test_evict_cancels_running_pipeline() {
        let manager = TileManager::new(stalling_registry(), &options(Some(0))).unwrap();
        let coord = TileCoord::new(3, 3, 3);

        manager.request_tiles(&[coord]);
        let tile = manager.tile(&coord).unwrap();
        assert_eq!(manager.in_flight(), 1);

        let evicted = manager.evict(coord).unwrap();
        assert!(Arc::ptr_eq(&tile, &evicted));
        assert_eq!(manager.in_flight(), 0);

        for _ in 0..500 {
            if tile.state().is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(tile.state(), TileState::Failed);
        // cancellation is not reported as a failure
        assert!(manager.try_recv_events().is_empty());
    }

    fn stalling_registry() -> PluginRegistry {
        PluginRegistry::new(vec![Arc::new(FnPlugin::new(
            "stall",
            Vec::<String>::new(),
            |ctx: PluginContext| {
                Box::pin(async move {
                    ctx.cancel_token().cancelled().await;
                    Err(MapError::Cancelled)
                }) as BoxFuture<'static, Result<()>>
            },
        )) as Arc<dyn PluginTrait>])
        .unwrap()
    }

    fn lru_options(capacity: usize, range: Option<u32>) -> PipelineOptions {
        let mut options = options(range);
        options.cache.eviction = EvictionPolicy::Lru { capacity };
        options
    }

    #[tokio::test]
    async fn test_lru_eviction_cancels_pipeline_silently() {
        let manager = TileManager::new(stalling_registry(), &lru_options(2, Some(0))).unwrap();
        let (a, b, c) = (
            TileCoord::new(0, 0, 2),
            TileCoord::new(1, 0, 2),
            TileCoord::new(2, 0, 2),
        );

        manager.request_tiles(&[a]);
        manager.request_tiles(&[b]);
        let first = manager.store().peek(&a).unwrap();
        assert_eq!(manager.in_flight(), 2);

        // a is the least recently used and makes room for c
        assert_eq!(manager.request_tiles(&[c]), vec![c]);
        assert!(!manager.store().contains(&a));
        assert_eq!(manager.in_flight(), 2);

        for _ in 0..500 {
            if first.state().is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(first.state(), TileState::Failed);
        assert!(matches!(first.error().as_deref(), Some(MapError::Cancelled)));
        assert!(manager.try_recv_events().is_empty());

        // b and c keep running
        assert!(manager.store().contains(&b));
        assert!(manager.store().contains(&c));
        manager.shutdown();
    }

    #[tokio::test]
    async fn test_selection_larger_than_store_does_not_thrash() {
        let runs = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let registry = || {
            let counter = runs.clone();
            PluginRegistry::new(vec![Arc::new(FnPlugin::new(
                "count",
                Vec::<String>::new(),
                move |_ctx: PluginContext| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Box::pin(async { Ok(()) }) as BoxFuture<'static, Result<()>>
                },
            )) as Arc<dyn PluginTrait>])
            .unwrap()
        };

        // a 3x3 block cannot live in a two-tile store
        assert!(matches!(
            TileManager::new(registry(), &lru_options(2, Some(1))),
            Err(MapError::Config(_))
        ));

        let manager = TileManager::new(registry(), &lru_options(2, None)).unwrap();
        let viewport = Viewport::default();
        let requested = manager.update_viewport(&viewport);
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0], viewport.center_tile());
        assert_eq!(manager.store().len(), 2);

        let events = collect(&manager, 2).await;
        assert_eq!(events.len(), 2);
        for event in &events {
            assert!(event.is_ready());
            assert!(manager.store().contains(&event.coord()));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(manager.try_recv_events().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_requests() {
        let registry = PluginRegistry::new(vec![stage("content", None)]).unwrap();
        let manager = TileManager::new(registry, &options(Some(0))).unwrap();

        manager.shutdown();
        assert!(manager.is_shut_down());
        assert!(manager.request_tiles(&[TileCoord::new(0, 0, 0)]).is_empty());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut bad = options(Some(1));
        bad.loading.max_concurrent_requests = 0;
        let registry = PluginRegistry::new(Vec::new()).unwrap();
        assert!(matches!(
            TileManager::new(registry, &bad),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_default_registry_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = options(Some(1));
        options.cache.directory = dir.path().to_path_buf();
        let source = TileDataSource::from_options(&options, LayerSet::from_tags(["buildings", "roads"]));

        let registry = default_registry(source).unwrap();
        assert_eq!(
            registry.names(),
            vec!["vector_data", "parse", "layer:buildings", "layer:roads"]
        );
        assert_eq!(registry.layers().url_segment(), "buildings,roads");
    }
}

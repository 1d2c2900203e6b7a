use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use vectile::{
    constants::{DEFAULT_CENTER, DEFAULT_ZOOM},
    tiles::TileConsumer,
    LatLng, MapError, PipelineOptions, PipelineProfile, PixelPoint, Tile, TileCoord, TileManager,
    Viewport,
};

#[derive(Parser)]
#[command(name = "vectile-app")]
#[command(about = "Load the vector tiles around a point and report what arrived", long_about = None)]
struct Args {
    /// Latitude in decimal degrees
    #[arg(long, default_value_t = DEFAULT_CENTER.0)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, default_value_t = DEFAULT_CENTER.1)]
    lon: f64,

    /// Zoom level (0-19)
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    zoom: u8,

    /// Tiles around the center tile; omit to cover the viewport instead
    #[arg(long)]
    range: Option<u32>,

    /// Comma-separated source layers to extract
    #[arg(long, default_value = "buildings,roads,water")]
    layers: String,

    /// JSON pipeline configuration; defaults to the balanced profile
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile server API key
    #[arg(long)]
    api_key: Option<String>,

    /// Directory for downloaded payloads
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Give up on tiles still loading after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Default)]
struct Summary {
    ready: usize,
    failed: usize,
    features: BTreeMap<String, usize>,
}

impl TileConsumer for Summary {
    fn on_tile_ready(&mut self, coord: TileCoord, tile: &Arc<Tile>) {
        self.ready += 1;
        for name in tile.output_names() {
            let count = tile
                .output(&name)
                .and_then(|value| value.as_array().map(Vec::len))
                .unwrap_or(0);
            *self.features.entry(name).or_insert(0) += count;
        }
        log::info!("tile {} ready", coord);
    }

    fn on_tile_failed(&mut self, coord: TileCoord, error: &Arc<MapError>) {
        self.failed += 1;
        log::error!("tile {} failed: {}", coord, error);
    }
}

fn load_options(args: &Args) -> vectile::Result<PipelineOptions> {
    let mut options = match &args.config {
        Some(path) => PipelineOptions::from_json_file(path)?,
        None => PipelineProfile::Balanced.resolve(),
    };
    options.loading.zoom = args.zoom;
    if args.range.is_some() {
        options.loading.range = args.range;
    }
    if let Some(key) = &args.api_key {
        options.source.api_key = key.clone();
    }
    if let Some(dir) = &args.cache_dir {
        options.cache.directory = dir.clone();
    }
    options.validate()?;
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let options = load_options(&args)?;
    let layers: Vec<&str> = args
        .layers
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect();
    let manager = TileManager::with_default_pipeline(&options, layers)?;
    log::debug!("{:?}", manager);

    let viewport = Viewport::new(
        LatLng::new(args.lat, args.lon),
        options.loading.zoom,
        PixelPoint::new(800.0, 600.0),
    );
    let requested = manager.update_viewport(&viewport);
    log::info!(
        "requested {} tiles around {:?} at zoom {}",
        requested.len(),
        viewport.center,
        viewport.zoom
    );

    let mut summary = Summary::default();
    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while summary.ready + summary.failed < requested.len() {
        if Instant::now() >= deadline {
            log::warn!("timed out with {} tiles still loading", manager.in_flight());
            break;
        }
        tokio::select! {
            _ = &mut ctrl_c => {
                log::warn!("interrupted");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                manager.dispatch_events(&mut summary);
            }
        }
    }
    manager.shutdown();

    log::info!("{} tiles ready, {} failed", summary.ready, summary.failed);
    for (layer, count) in &summary.features {
        log::info!("  {}: {} features", layer, count);
    }
    println!(
        "{} ready, {} failed of {} requested",
        summary.ready,
        summary.failed,
        requested.len()
    );

    Ok(())
}

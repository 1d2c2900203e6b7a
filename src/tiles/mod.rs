pub mod cache;
pub mod data_source;
pub mod disk;
pub mod loader;
pub mod manager;
pub mod selector;
pub mod source;
pub mod tile;

// Re-exports for convenience
pub use cache::{EvictionHook, TileStore};
pub use data_source::TileDataSource;
pub use disk::DiskCache;
pub use loader::{HttpFetcher, TileFetcher};
pub use manager::{TileConsumer, TileEvent, TileManager};
pub use selector::{SelectionMode, TileSelector};
pub use source::{MapzenSource, TileSource};
pub use tile::{Tile, TileState};

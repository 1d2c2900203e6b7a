pub mod base;
pub mod layer;
pub mod parse;
pub mod registry;
pub mod scheduler;
pub mod vector_data;

pub use base::{BasePlugin, FnPlugin, PluginContext, PluginTrait};
pub use layer::LayerPlugin;
pub use parse::GeoJsonParsePlugin;
pub use registry::{LayerSet, PluginRegistry};
pub use scheduler::{PluginRun, PluginScheduler, PluginStatus};
pub use vector_data::VectorDataPlugin;

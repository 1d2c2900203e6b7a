use crate::data::geojson::VectorTileDocument;
use crate::plugins::base::{PluginContext, PluginTrait};
use crate::plugins::registry::LayerSet;
use crate::plugins::vector_data::VectorDataPlugin;
use crate::runtime::execute_blocking;
use crate::{MapError, Result};
use async_trait::async_trait;

/// Turns the raw payload into a [`VectorTileDocument`] on the blocking pool.
pub struct GeoJsonParsePlugin {
    source_stage: String,
    single_layer: Option<String>,
}

impl GeoJsonParsePlugin {
    pub const NAME: &'static str = "parse";

    pub fn new() -> Self {
        Self {
            source_stage: VectorDataPlugin::NAME.to_string(),
            single_layer: None,
        }
    }

    /// A single-layer request comes back as a bare `FeatureCollection`;
    /// remember which layer that is.
    pub fn for_layers(layers: &LayerSet) -> Self {
        Self {
            single_layer: layers.single().map(String::from),
            ..Self::new()
        }
    }

    /// Read the payload published by another stage.
    pub fn with_source_stage(mut self, name: impl Into<String>) -> Self {
        self.source_stage = name.into();
        self
    }
}

impl Default for GeoJsonParsePlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginTrait for GeoJsonParsePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![self.source_stage.clone()]
    }

    async fn create(&self, ctx: &PluginContext) -> Result<()> {
        let payload = ctx
            .tile()
            .raw_payload()
            .ok_or(MapError::MissingPayload(ctx.coord()))?;
        let single_layer = self.single_layer.clone();

        let document = execute_blocking(move || {
            VectorTileDocument::parse(&payload, single_layer.as_deref())
        })
        .await?;

        ctx.check_cancelled()?;
        log::debug!(
            "parsed tile {}: {} features in {} layers",
            ctx.coord(),
            document.feature_count(),
            document.layers.len()
        );
        ctx.tile().set_parsed_data(document)
    }
}

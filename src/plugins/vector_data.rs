use crate::plugins::base::{PluginContext, PluginTrait};
use crate::tiles::data_source::TileDataSource;
use crate::Result;
use async_trait::async_trait;

/// Downloads (or reads from disk) the raw vector payload of a tile.
pub struct VectorDataPlugin {
    source: TileDataSource,
}

impl VectorDataPlugin {
    pub const NAME: &'static str = "vector_data";

    pub fn new(source: TileDataSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &TileDataSource {
        &self.source
    }
}

#[async_trait]
impl PluginTrait for VectorDataPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn create(&self, ctx: &PluginContext) -> Result<()> {
        ctx.check_cancelled()?;
        let payload = self.source.fetch(ctx.coord(), ctx.cancel_token()).await?;
        log::debug!("tile {} payload ready ({} bytes)", ctx.coord(), payload.len());
        ctx.tile().set_raw_payload(payload)
    }
}

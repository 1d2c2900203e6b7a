use crate::plugins::base::{PluginContext, PluginTrait};
use crate::plugins::parse::GeoJsonParsePlugin;
use crate::{MapError, Result};
use async_trait::async_trait;

/// Extracts the features of one source layer from the parsed document and
/// publishes them as the output `layer:{tag}`.
pub struct LayerPlugin {
    tag: String,
    name: String,
}

impl LayerPlugin {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            name: Self::output_name(&tag),
            tag,
        }
    }

    /// Output key for a layer tag
    pub fn output_name(tag: &str) -> String {
        format!("layer:{}", tag)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[async_trait]
impl PluginTrait for LayerPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        vec![GeoJsonParsePlugin::NAME.to_string()]
    }

    fn layer(&self) -> Option<&str> {
        Some(&self.tag)
    }

    async fn create(&self, ctx: &PluginContext) -> Result<()> {
        let document = ctx.tile().parsed_data().ok_or_else(|| {
            MapError::Plugin(format!("tile {} has no parsed data", ctx.coord()))
        })?;
        let features = document.layer(&self.tag).unwrap_or(&[]);
        if features.is_empty() {
            log::debug!("tile {} has no '{}' features", ctx.coord(), self.tag);
        }
        let value = serde_json::to_value(features)?;
        ctx.tile().set_output(&self.name, value)
    }
}

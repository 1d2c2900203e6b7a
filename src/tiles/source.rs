use crate::core::config::SourceConfig;
use crate::core::geo::TileCoord;
use crate::plugins::registry::LayerSet;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord` restricted to `layers`.
    fn url(&self, coord: TileCoord, layers: &LayerSet) -> String;
}

/// Mapzen-style vector tile endpoint:
/// `{base_url}/{layers}/{z}/{x}/{y}.{format}?api_key={key}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapzenSource {
    base_url: String,
    api_key: String,
    format: String,
}

impl MapzenSource {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            format: "json".to_string(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone()).with_format(&config.format)
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }
}

impl Default for MapzenSource {
    fn default() -> Self {
        Self::from_config(&SourceConfig::default())
    }
}

impl TileSource for MapzenSource {
    fn url(&self, coord: TileCoord, layers: &LayerSet) -> String {
        let base = self.base_url.trim_end_matches('/');
        let mut url = format!(
            "{}/{}/{}/{}/{}.{}",
            base,
            layers.url_segment(),
            coord.z,
            coord.x,
            coord.y,
            self.format
        );
        if !self.api_key.is_empty() {
            url.push_str("?api_key=");
            url.push_str(&self.api_key);
        }
        url
    }
}

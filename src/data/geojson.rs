use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Layer name used when a payload is a bare `FeatureCollection`.
pub const DEFAULT_LAYER: &str = "all";

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl GeoJsonFeature {
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref()?.get(key)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<GeoJsonFeature>,
}

/// Parsed content of one vector tile: features grouped by source layer.
///
/// Vector tile servers answer either with a single `FeatureCollection` or,
/// when several layers are requested at once, with an object mapping each
/// layer name to its own `FeatureCollection`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorTileDocument {
    pub layers: BTreeMap<String, Vec<GeoJsonFeature>>,
}

impl VectorTileDocument {
    /// Parses a raw payload. `single_layer` names the layer a bare
    /// `FeatureCollection` belongs to.
    pub fn parse(payload: &[u8], single_layer: Option<&str>) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(payload)?;
        Self::from_value(value, single_layer)
    }

    pub fn from_value(value: serde_json::Value, single_layer: Option<&str>) -> Result<Self> {
        let object = match value {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(MapError::ParseError(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut layers = BTreeMap::new();

        if object.get("type").and_then(|t| t.as_str()) == Some("FeatureCollection") {
            let collection: FeatureCollection =
                serde_json::from_value(serde_json::Value::Object(object))?;
            let name = single_layer.unwrap_or(DEFAULT_LAYER).to_string();
            layers.insert(name, collection.features);
            return Ok(Self { layers });
        }

        for (name, layer) in object {
            let collection: FeatureCollection = serde_json::from_value(layer)
                .map_err(|e| MapError::ParseError(format!("layer '{}': {}", name, e)))?;
            if collection.kind != "FeatureCollection" {
                return Err(MapError::ParseError(format!(
                    "layer '{}' is a {}, not a FeatureCollection",
                    name, collection.kind
                )));
            }
            layers.insert(name, collection.features);
        }

        Ok(Self { layers })
    }

    pub fn layer(&self, name: &str) -> Option<&[GeoJsonFeature]> {
        self.layers.get(name).map(Vec::as_slice)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn feature_count(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

//! Decoded vector tile types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::proto;
use crate::coord::LatLng;

/// Tile-local coordinate space size used when a layer omits `extent`.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Feature property map, ordered by key.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A typed MVT property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
}

impl PropertyValue {
    /// Convert a protobuf value; `None` when no variant is set.
    pub(crate) fn from_proto(value: &proto::Value) -> Option<Self> {
        if let Some(v) = &value.string_value {
            return Some(Self::String(v.clone()));
        }
        if let Some(v) = value.float_value {
            return Some(Self::Float(v));
        }
        if let Some(v) = value.double_value {
            return Some(Self::Double(v));
        }
        if let Some(v) = value.int_value {
            return Some(Self::Int(v));
        }
        if let Some(v) = value.uint_value {
            return Some(Self::UInt(v));
        }
        if let Some(v) = value.sint_value {
            return Some(Self::SInt(v));
        }
        value.bool_value.map(Self::Bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => f.write_str(v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Int(v) | Self::SInt(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Feature geometry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    Unknown,
}

impl GeometryType {
    /// Map the raw MVT geometry type field.
    pub fn from_raw(raw: Option<i32>) -> Self {
        match raw {
            Some(1) => Self::Point,
            Some(2) => Self::LineString,
            Some(3) => Self::Polygon,
            _ => Self::Unknown,
        }
    }
}

/// Per-layer summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    pub name: String,
    /// Total features in the layer, not just the sampled ones.
    pub feature_count: usize,
    pub extent: u32,
    pub version: u32,
}

/// A sampled feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub geometry_type: GeometryType,
    pub properties: Properties,
    /// First few points of the first ring, only when a tile was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_geometry: Option<Vec<LatLng>>,
    pub layer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileStatistics {
    /// Length of the input buffer as received.
    pub size_bytes: usize,
    pub layer_count: usize,
    /// Number of sampled features returned.
    pub features_total: usize,
    pub parse_time_ms: f64,
}

/// Diagnostic decode of one tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTile {
    pub layers: BTreeMap<String, LayerInfo>,
    pub features: Vec<Feature>,
    pub statistics: TileStatistics,
}

impl ParsedTile {
    /// True when nothing could be decoded.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.features.is_empty()
    }
}

/// One fully decoded LineString ring in geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadGeometry {
    pub layer_name: String,
    pub properties: Properties,
    pub coordinates: Vec<LatLng>,
}

impl RoadGeometry {
    /// First property among `keys` that is present, rendered as text.
    pub fn property_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.properties.get(*key))
            .map(|value| value.to_string())
    }
}

//! Feed payload wire format.
//!
//! Both endpoints answer `{ "geojson": ..., "last_update": ... }` where
//! `geojson` is either a FeatureCollection object or a bare array of
//! features. Only Point features are kept.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use foundation::geo::LatLon;
use foundation::time::{parse_timestamp, timestamp_from_millis};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Which remote feed a payload came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeedKind {
    Stations,
    Firms,
}

impl FeedKind {
    pub const ALL: [FeedKind; 2] = [FeedKind::Stations, FeedKind::Firms];

    pub fn name(self) -> &'static str {
        match self {
            FeedKind::Stations => "stations",
            FeedKind::Firms => "firms",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature<P> {
    pub location: LatLon,
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn new(location: LatLon, properties: P) -> Self {
        Self {
            location,
            properties,
        }
    }
}

/// Immutable, cheaply clonable feature sequence in feed order.
#[derive(Debug)]
pub struct FeatureCollection<P> {
    features: Arc<[Feature<P>]>,
}

impl<P> Clone for FeatureCollection<P> {
    fn clone(&self) -> Self {
        Self {
            features: Arc::clone(&self.features),
        }
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self {
            features: Arc::from(Vec::new()),
        }
    }
}

impl<P> FeatureCollection<P> {
    pub fn new(features: Vec<Feature<P>>) -> Self {
        Self {
            features: Arc::from(features),
        }
    }

    pub fn features(&self) -> &[Feature<P>] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature<P>> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// True when both handles share the same backing storage.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.features, &other.features)
    }
}

impl<P: Clone> FeatureCollection<P> {
    pub fn filtered(&self, mut keep: impl FnMut(&Feature<P>) -> bool) -> Self {
        Self::new(self.iter().filter(|f| keep(*f)).cloned().collect())
    }
}

impl<P> From<Vec<Feature<P>>> for FeatureCollection<P> {
    fn from(features: Vec<Feature<P>>) -> Self {
        Self::new(features)
    }
}

impl<'a, P> IntoIterator for &'a FeatureCollection<P> {
    type Item = &'a Feature<P>;
    type IntoIter = std::slice::Iter<'a, Feature<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A decoded feed response.
#[derive(Debug, Clone)]
pub struct FeedPayload<P> {
    pub collection: FeatureCollection<P>,
    /// `None` when absent or unparseable; see `last_update_raw`.
    pub last_update: Option<DateTime<Utc>>,
    pub last_update_raw: Option<String>,
    /// Features skipped for lacking a usable Point geometry or properties.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The body was not JSON.
    Json(String),
    /// JSON, but not a `{ geojson, last_update }` envelope.
    Shape(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Json(msg) => write!(f, "feed body is not valid JSON: {msg}"),
            FeedError::Shape(msg) => write!(f, "unexpected feed shape: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {}

#[derive(Deserialize)]
struct RawEnvelope {
    geojson: Option<RawCollection>,
    #[serde(default)]
    last_update: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCollection {
    Collection { features: Vec<Value> },
    Bare(Vec<Value>),
}

#[derive(Deserialize)]
struct RawFeature<P> {
    geometry: Option<RawGeometry>,
    properties: Option<P>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

pub fn parse_payload<P>(body: &[u8]) -> Result<FeedPayload<P>, FeedError>
where
    P: DeserializeOwned + Default,
{
    let value: Value = serde_json::from_slice(body).map_err(|e| FeedError::Json(e.to_string()))?;
    payload_from_value(value)
}

pub fn payload_from_value<P>(value: Value) -> Result<FeedPayload<P>, FeedError>
where
    P: DeserializeOwned + Default,
{
    if !value.is_object() {
        return Err(FeedError::Shape("payload is not an object".to_string()));
    }
    let envelope: RawEnvelope =
        serde_json::from_value(value).map_err(|e| FeedError::Shape(e.to_string()))?;
    let Some(collection) = envelope.geojson else {
        return Err(FeedError::Shape("missing `geojson`".to_string()));
    };

    let raw_features = match collection {
        RawCollection::Collection { features } => features,
        RawCollection::Bare(features) => features,
    };

    let total = raw_features.len();
    let features: Vec<Feature<P>> = raw_features.into_iter().filter_map(decode_feature).collect();
    let dropped = total - features.len();

    let (last_update, last_update_raw) = decode_last_update(&envelope.last_update);

    Ok(FeedPayload {
        collection: FeatureCollection::new(features),
        last_update,
        last_update_raw,
        dropped,
    })
}

fn decode_feature<P>(value: Value) -> Option<Feature<P>>
where
    P: DeserializeOwned + Default,
{
    let raw: RawFeature<P> = serde_json::from_value(value).ok()?;
    let geometry = raw.geometry?;
    if geometry.kind != "Point" {
        return None;
    }
    let position: Vec<f64> = serde_json::from_value(geometry.coordinates).ok()?;
    let location = LatLon::from_geojson_position(&position)?;
    Some(Feature::new(location, raw.properties.unwrap_or_default()))
}

fn decode_last_update(value: &Value) -> (Option<DateTime<Utc>>, Option<String>) {
    match value {
        Value::String(s) => (parse_timestamp(s), Some(s.clone())),
        Value::Number(n) => (n.as_i64().and_then(timestamp_from_millis), Some(n.to_string())),
        _ => (None, None),
    }
}

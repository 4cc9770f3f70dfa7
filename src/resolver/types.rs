use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a position record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PositionSource {
    FastCache,
    LiveTelemetry,
    LocalFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub id: String,
    pub name: String,
    pub lat_deg: f64,
    pub lng_deg: f64,
    pub altitude_km: f64,
    pub velocity_km_s: f64,
    pub timestamp: DateTime<Utc>,
    pub source: PositionSource,
}

/// Fast cache key. Observer coordinates are quantized to 1e-4 degrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    id: String,
    lat_e4: i64,
    lng_e4: i64,
}

impl PositionKey {
    pub fn new(id: &str, observer_lat: f64, observer_lng: f64) -> Self {
        Self {
            id: id.to_string(),
            lat_e4: (observer_lat * 1e4).round() as i64,
            lng_e4: (observer_lng * 1e4).round() as i64,
        }
    }
}

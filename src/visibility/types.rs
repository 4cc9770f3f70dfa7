use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_max_elevation(max_elevation_deg: f64) -> Self {
        if max_elevation_deg > 60.0 {
            Confidence::High
        } else if max_elevation_deg > 30.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    VisiblePass,
}

/// A contiguous interval with the object above the elevation threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityEvent {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub peak_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_sec: i64,
    pub max_elevation_deg: f64,
    pub confidence: Confidence,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

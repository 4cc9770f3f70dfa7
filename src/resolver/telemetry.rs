use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;

use crate::config::TelemetryConfig;

use super::error::TelemetryError;

/// A single position report from the live telemetry API.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFix {
    pub name: Option<String>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub timestamp: DateTime<Utc>,
}

pub trait TelemetryClient: Send + Sync {
    fn current_position(
        &self,
        object_id: &str,
        observer_lat: f64,
        observer_lng: f64,
    ) -> impl Future<Output = Result<TelemetryFix, TelemetryError>> + Send;
}

/// Client for the N2YO REST positions endpoint.
pub struct N2yoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl N2yoClient {
    /// `Ok(None)` when no credential is configured.
    pub fn from_config(config: &TelemetryConfig) -> Result<Option<Self>, TelemetryError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .user_agent(concat!("orbitwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Some(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }))
    }
}

impl TelemetryClient for N2yoClient {
    async fn current_position(
        &self,
        object_id: &str,
        observer_lat: f64,
        observer_lng: f64,
    ) -> Result<TelemetryFix, TelemetryError> {
        let url = format!(
            "{}/positions/{}/{}/{}/0/1/",
            self.base_url, object_id, observer_lat, observer_lng
        );
        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        let body: PositionsResponse = response.json().await?;
        body.into_fix()
    }
}

#[derive(Debug, Deserialize)]
struct PositionsResponse {
    #[serde(default)]
    info: Option<ResponseInfo>,
    #[serde(default)]
    positions: Vec<ResponsePosition>,
}

#[derive(Debug, Deserialize)]
struct ResponseInfo {
    satname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsePosition {
    satlatitude: f64,
    satlongitude: f64,
    sataltitude: f64,
    timestamp: i64,
}

impl PositionsResponse {
    fn into_fix(self) -> Result<TelemetryFix, TelemetryError> {
        let position = self
            .positions
            .into_iter()
            .next()
            .ok_or(TelemetryError::NoFix)?;
        let timestamp =
            DateTime::from_timestamp(position.timestamp, 0).ok_or(TelemetryError::NoFix)?;
        Ok(TelemetryFix {
            name: self.info.and_then(|info| info.satname),
            latitude_deg: position.satlatitude,
            longitude_deg: position.satlongitude,
            altitude_km: position.sataltitude,
            timestamp,
        })
    }
}

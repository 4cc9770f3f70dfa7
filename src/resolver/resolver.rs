use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;

use crate::cache::TtlCache;
use crate::catalog::{Catalog, TrackedObject};
use crate::clock::Clock;
use crate::config::ResolverConfig;
use crate::error::TrackingError;
use crate::propagation::{geodetic_at, Propagator, EARTH_MU_KM3_S2, EARTH_RADIUS_KM};

use super::error::TelemetryError;
use super::telemetry::{TelemetryClient, TelemetryFix};
use super::types::{PositionKey, PositionRecord, PositionSource};

/// Resolves a live position through fast cache, live telemetry and finally
/// local propagation from the catalog.
pub struct PositionResolver<T> {
    telemetry: Option<T>,
    telemetry_timeout: Duration,
    propagator: Arc<dyn Propagator>,
    clock: Arc<dyn Clock>,
    fast_cache: TtlCache<PositionKey, PositionRecord>,
}

impl<T: TelemetryClient> PositionResolver<T> {
    pub fn new(
        config: &ResolverConfig,
        telemetry: Option<T>,
        propagator: Arc<dyn Propagator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            telemetry,
            telemetry_timeout: config.telemetry.timeout,
            propagator,
            clock,
            fast_cache: TtlCache::new(config.fast_cache_ttl),
        }
    }

    /// `catalog` is only awaited when both the fast cache and live telemetry
    /// come up empty.
    pub async fn resolve<C, Fut>(
        &self,
        object_id: &str,
        observer_lat: f64,
        observer_lng: f64,
        catalog: C,
    ) -> Result<PositionRecord, TrackingError>
    where
        C: FnOnce() -> Fut,
        Fut: Future<Output = Arc<Catalog>>,
    {
        let now = self.clock.now();
        let key = PositionKey::new(object_id, observer_lat, observer_lng);

        if let Some(hit) = self.fast_cache.get_fresh(&key, now) {
            return Ok(PositionRecord {
                source: PositionSource::FastCache,
                ..(*hit).clone()
            });
        }

        if let Some(client) = &self.telemetry {
            match self
                .live_fix(client, object_id, observer_lat, observer_lng)
                .await
            {
                Ok(fix) => {
                    let record = record_from_fix(object_id, fix);
                    // Expired fixes stay behind as the last-resort tier.
                    self.fast_cache.insert(key, record.clone(), now);
                    return Ok(record);
                }
                Err(e) => warn!("Live telemetry for {} unavailable: {}", object_id, e),
            }
        }

        let catalog = catalog().await;
        let Some(object) = catalog.get(object_id) else {
            return self
                .last_known(&key)
                .ok_or_else(|| TrackingError::NotFound(object_id.to_string()));
        };

        match self.propagate(object, now) {
            Ok(record) => {
                debug!("Resolved {} by local propagation", object_id);
                Ok(record)
            }
            Err(e) => self.last_known(&key).ok_or(e),
        }
    }

    async fn live_fix(
        &self,
        client: &T,
        object_id: &str,
        observer_lat: f64,
        observer_lng: f64,
    ) -> Result<TelemetryFix, TelemetryError> {
        let limit = self
            .telemetry_timeout
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        timeout(
            limit,
            client.current_position(object_id, observer_lat, observer_lng),
        )
        .await
        .map_err(|_| TelemetryError::Timeout)?
    }

    fn propagate(
        &self,
        object: &TrackedObject,
        now: DateTime<Utc>,
    ) -> Result<PositionRecord, TrackingError> {
        let (state, geodetic) =
            geodetic_at(self.propagator.as_ref(), &object.elements, now).map_err(|source| {
                TrackingError::Propagation {
                    id: object.id.clone(),
                    source,
                }
            })?;

        Ok(PositionRecord {
            id: object.id.clone(),
            name: object.name.clone(),
            lat_deg: geodetic.latitude_deg,
            lng_deg: geodetic.longitude_deg,
            altitude_km: geodetic.altitude_km,
            velocity_km_s: state.speed_km_s(),
            timestamp: now,
            source: PositionSource::LocalFallback,
        })
    }

    /// An expired live fix, served only when every other tier has failed.
    fn last_known(&self, key: &PositionKey) -> Option<PositionRecord> {
        self.fast_cache.get_stale(key).map(|stale| {
            warn!("Serving expired live position for {}", stale.id);
            PositionRecord {
                source: PositionSource::FastCache,
                ..(*stale).clone()
            }
        })
    }
}

fn record_from_fix(object_id: &str, fix: TelemetryFix) -> PositionRecord {
    PositionRecord {
        id: object_id.to_string(),
        name: fix.name.unwrap_or_else(|| format!("NORAD {object_id}")),
        lat_deg: fix.latitude_deg,
        lng_deg: fix.longitude_deg,
        altitude_km: fix.altitude_km,
        velocity_km_s: circular_speed_km_s(fix.altitude_km),
        timestamp: fix.timestamp,
        source: PositionSource::LiveTelemetry,
    }
}

/// Speed of a circular orbit at `altitude_km`; the live API reports no velocity.
fn circular_speed_km_s(altitude_km: f64) -> f64 {
    (EARTH_MU_KM3_S2 / (EARTH_RADIUS_KM + altitude_km.max(0.0))).sqrt()
}

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogAggregator, HttpFetcher, SourceFetcher};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{StartupError, TrackingError};
use crate::footprint::{FootprintGenerator, VisibilityFootprint};
use crate::propagation::{Observer, Propagator, Sgp4Propagator};
use crate::resolver::{N2yoClient, PositionRecord, PositionResolver, TelemetryClient};
use crate::visibility::{VisibilityEvent, VisibilityService};

/// Owns every tracking component. Built once at startup and shared.
pub struct TrackingService<F = HttpFetcher, T = N2yoClient> {
    catalog: CatalogAggregator<F>,
    resolver: PositionResolver<T>,
    visibility: VisibilityService,
    footprints: FootprintGenerator,
    clock: Arc<dyn Clock>,
}

impl TrackingService {
    /// Production wiring: HTTP catalog sources, N2YO telemetry when a key is
    /// configured, SGP4 propagation.
    pub fn from_config(config: Config, clock: Arc<dyn Clock>) -> Result<Self, StartupError> {
        let fetcher = HttpFetcher::new()?;
        let telemetry = N2yoClient::from_config(&config.resolver.telemetry)?;
        if telemetry.is_none() {
            log::info!("No telemetry API key configured, positions come from local propagation");
        }
        Ok(Self::new(
            config,
            fetcher,
            telemetry,
            Arc::new(Sgp4Propagator),
            clock,
        ))
    }
}

impl<F: SourceFetcher, T: TelemetryClient> TrackingService<F, T> {
    pub fn new(
        config: Config,
        fetcher: F,
        telemetry: Option<T>,
        propagator: Arc<dyn Propagator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver: PositionResolver::new(
                &config.resolver,
                telemetry,
                Arc::clone(&propagator),
                Arc::clone(&clock),
            ),
            catalog: CatalogAggregator::new(
                config.catalog,
                fetcher,
                Arc::clone(&propagator),
                Arc::clone(&clock),
            ),
            visibility: VisibilityService::new(
                config.visibility,
                Arc::clone(&propagator),
                Arc::clone(&clock),
            ),
            footprints: FootprintGenerator::new(config.footprint, propagator, Arc::clone(&clock)),
            clock,
        }
    }

    pub async fn catalog(&self) -> Arc<Catalog> {
        self.catalog.catalog().await
    }

    pub async fn position(
        &self,
        object_id: &str,
        observer_lat: f64,
        observer_lng: f64,
    ) -> Result<PositionRecord, TrackingError> {
        self.resolver
            .resolve(object_id, observer_lat, observer_lng, || self.catalog.catalog())
            .await
    }

    pub async fn passes(
        &self,
        object_id: &str,
        observer: &Observer,
    ) -> Result<Arc<Vec<VisibilityEvent>>, TrackingError> {
        let catalog = self.catalog.catalog().await;
        let object = catalog
            .get(object_id)
            .ok_or_else(|| TrackingError::NotFound(object_id.to_string()))?;
        Ok(self.visibility.passes(object_id, &object.elements, observer))
    }

    /// Footprint of a catalogued object at `time` (default now). `Ok(None)`
    /// when the object cannot be propagated to that instant.
    pub async fn footprint(
        &self,
        object_id: &str,
        time: Option<DateTime<Utc>>,
    ) -> Result<Option<Arc<VisibilityFootprint>>, TrackingError> {
        let time = time.unwrap_or_else(|| self.clock.now());
        let catalog = self.catalog.catalog().await;
        let object = catalog
            .get(object_id)
            .ok_or_else(|| TrackingError::NotFound(object_id.to_string()))?;
        Ok(self.footprints.compute(Some(&object.elements), time, None))
    }

    /// Footprint around a fixed point, for events that have no orbit.
    pub fn static_footprint(&self, lat: f64, lng: f64) -> Option<Arc<VisibilityFootprint>> {
        self.footprints.compute(None, self.clock.now(), Some((lat, lng)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, CatalogSource, Category, OrbitRegime};
    use crate::clock::FixedClock;
    use crate::footprint::FootprintMode;
    use crate::propagation::fixtures::*;
    use crate::resolver::PositionSource;
    use chrono::{Duration, TimeZone};

    struct FixtureFetcher(String);

    impl SourceFetcher for FixtureFetcher {
        async fn fetch(&self, _source: &CatalogSource) -> Result<String, CatalogError> {
            Ok(self.0.clone())
        }
    }

    fn service() -> TrackingService<FixtureFetcher> {
        let mut config = Config::default();
        config.catalog.sources = vec![CatalogSource {
            name: "fixture".to_string(),
            url: "http://fixture/".to_string(),
            category: Category::Station,
            timeout: Duration::seconds(1),
        }];
        let text = tle_text(&[
            (ISS_NAME, ISS_LINE1, ISS_LINE2),
            (GPS_NAME, GPS_LINE1, GPS_LINE2),
            (GEO_NAME, GEO_LINE1, GEO_LINE2),
        ]);
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2008, 9, 20, 12, 30, 0).unwrap());
        TrackingService::new(
            config,
            FixtureFetcher(text),
            None,
            Arc::new(Sgp4Propagator),
            Arc::new(clock),
        )
    }

    #[tokio::test]
    async fn catalog_feeds_every_consumer() {
        let service = service();

        let catalog = service.catalog().await;
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("25544").unwrap().orbit_regime, OrbitRegime::Leo);

        let position = service.position("25544", 40.7128, -74.006).await.unwrap();
        assert_eq!(position.source, PositionSource::LocalFallback);

        let observer = Observer::new(40.7128, -74.006, 0.0);
        let passes = service.passes("25544", &observer).await.unwrap();
        assert!(!passes.is_empty());

        let footprint = service.footprint("25544", None).await.unwrap().unwrap();
        assert_eq!(footprint.mode, FootprintMode::Orbital);
    }

    #[tokio::test]
    async fn unknown_object_is_not_found_everywhere() {
        let service = service();
        let observer = Observer::default();

        assert!(matches!(
            service.position("99999", 0.0, 0.0).await,
            Err(TrackingError::NotFound(_))
        ));
        assert!(matches!(
            service.passes("99999", &observer).await,
            Err(TrackingError::NotFound(_))
        ));
        assert!(matches!(
            service.footprint("99999", None).await,
            Err(TrackingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn static_footprint_needs_no_catalog() {
        let service = service();
        let footprint = service.static_footprint(-33.9, 18.4).unwrap();
        assert_eq!(footprint.mode, FootprintMode::Static);
    }
}

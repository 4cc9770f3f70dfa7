use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::cache::CacheEntry;
use crate::clock::Clock;
use crate::config::CatalogConfig;
use crate::propagation::{geodetic_at, ElementSet, Propagator};

use super::error::CatalogError;
use super::parsing::parse_element_groups;
use super::source::{CatalogSource, SourceFetcher};
use super::types::{Catalog, OrbitRegime, TrackedObject};

type SourceOutcome = (usize, CatalogSource, Result<String, CatalogError>);

/// Merges every configured source into one catalog and keeps it cached.
pub struct CatalogAggregator<F> {
    config: CatalogConfig,
    fetcher: Arc<F>,
    propagator: Arc<dyn Propagator>,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<CacheEntry<Arc<Catalog>>>>,
    refresh_lock: Mutex<()>,
    last_failure: StdMutex<Option<DateTime<Utc>>>,
}

impl<F: SourceFetcher> CatalogAggregator<F> {
    pub fn new(
        config: CatalogConfig,
        fetcher: F,
        propagator: Arc<dyn Propagator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            propagator,
            clock,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            last_failure: StdMutex::new(None),
        }
    }

    /// Current catalog. Refreshes once the TTL has run out and keeps serving
    /// the previous snapshot if that refresh fails. After a failure, no new
    /// attempt is made until `retry_backoff` has passed.
    pub async fn catalog(&self) -> Arc<Catalog> {
        if let Some(catalog) = self.fresh() {
            return catalog;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(catalog) = self.fresh() {
            return catalog;
        }
        if self.backing_off() {
            return self.snapshot().unwrap_or_else(|| Arc::new(Catalog::empty()));
        }

        match self.refresh().await {
            Ok(catalog) => {
                self.set_last_failure(None);
                catalog
            }
            Err(e) => {
                self.set_last_failure(Some(self.clock.now()));
                match self.snapshot() {
                    Some(stale) => {
                        warn!(
                            "Catalog refresh failed ({}), serving {} objects from {:?}",
                            e,
                            stale.len(),
                            stale.fetched_at()
                        );
                        stale
                    }
                    None => {
                        warn!("Catalog refresh failed ({}) and nothing is cached", e);
                        Arc::new(Catalog::empty())
                    }
                }
            }
        }
    }

    /// Fetches all sources and atomically replaces the cached catalog.
    pub async fn refresh(&self) -> Result<Arc<Catalog>, CatalogError> {
        let outcomes = self.fetch_all().await;
        if outcomes.iter().all(|(_, _, result)| result.is_err()) {
            return Err(CatalogError::AllSourcesFailed);
        }

        let now = self.clock.now();
        let mut merged = Vec::new();
        for (_, source, result) in outcomes {
            match result {
                Ok(text) => {
                    let objects = build_objects(&source, &text, self.propagator.as_ref(), now);
                    debug!("Source {} contributed {} objects", source.name, objects.len());
                    merged.extend(objects);
                }
                Err(e) => warn!("Catalog source {} unavailable: {}", source.name, e),
            }
        }

        let mut catalog = Catalog::new(merged, now);
        if catalog.is_empty() {
            return Err(CatalogError::NoObjects);
        }
        if !self.config.overrides.is_empty() {
            catalog = apply_overrides(catalog, &self.config, now);
        }

        info!(
            "Catalog refreshed: {} objects {:?}",
            catalog.len(),
            catalog.regime_counts()
        );

        let catalog = Arc::new(catalog);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(CacheEntry::new(Arc::clone(&catalog), now));
        Ok(catalog)
    }

    fn fresh(&self) -> Option<Arc<Catalog>> {
        let now = self.clock.now();
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current
            .as_ref()
            .filter(|entry| entry.is_valid(now, self.config.ttl))
            .map(|entry| Arc::clone(&entry.value))
    }

    fn backing_off(&self) -> bool {
        let last_failure = self.last_failure.lock().unwrap_or_else(PoisonError::into_inner);
        last_failure.is_some_and(|failed_at| self.clock.now() - failed_at < self.config.retry_backoff)
    }

    fn set_last_failure(&self, failed_at: Option<DateTime<Utc>>) {
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = failed_at;
    }

    fn snapshot(&self) -> Option<Arc<Catalog>> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|entry| Arc::clone(&entry.value))
    }

    /// Fans out one task per source and waits for all of them to settle.
    /// Results come back in configured order, whatever order they finished in.
    async fn fetch_all(&self) -> Vec<SourceOutcome> {
        let mut tasks = JoinSet::new();
        for (idx, source) in self.config.sources.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                let limit = source
                    .timeout
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);
                let result = match timeout(limit, fetcher.fetch(&source)).await {
                    Ok(result) => result,
                    Err(_) => Err(CatalogError::Timeout {
                        source_name: source.name.clone(),
                        after_secs: source.timeout.num_seconds(),
                    }),
                };
                (idx, source, result)
            });
        }

        let mut outcomes = Vec::with_capacity(self.config.sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Catalog fetch task aborted: {}", e),
            }
        }
        outcomes.sort_by_key(|(idx, _, _)| *idx);
        outcomes
    }
}

fn build_objects(
    source: &CatalogSource,
    text: &str,
    propagator: &dyn Propagator,
    now: DateTime<Utc>,
) -> Vec<TrackedObject> {
    let mut objects = Vec::new();

    for group in parse_element_groups(text) {
        let elements = match ElementSet::from_lines(group.name, &group.line1, &group.line2) {
            Ok(elements) => elements,
            Err(e) => {
                debug!("{}: skipping element group: {}", source.name, e);
                continue;
            }
        };

        let (state, geodetic) = match geodetic_at(propagator, &elements, now) {
            Ok(result) => result,
            Err(e) => {
                debug!(
                    "{}: skipping {} ({}): {}",
                    source.name,
                    elements.name,
                    elements.catalog_id(),
                    e
                );
                continue;
            }
        };

        objects.push(TrackedObject {
            id: elements.catalog_id(),
            name: elements.name.clone(),
            category: source.category,
            orbit_regime: OrbitRegime::classify(geodetic.altitude_km),
            inclination_deg: elements.inclination_deg(),
            altitude_km: geodetic.altitude_km,
            period_min: elements.period_minutes(),
            velocity_km_s: state.speed_km_s(),
            lat_deg: geodetic.latitude_deg,
            lng_deg: geodetic.longitude_deg,
            operator: None,
            mission_type: None,
            source: source.name.clone(),
            elements,
        });
    }

    objects
}

fn apply_overrides(catalog: Catalog, config: &CatalogConfig, now: DateTime<Utc>) -> Catalog {
    let objects = catalog
        .objects()
        .iter()
        .cloned()
        .map(|mut object| {
            if let Some(ov) = config.overrides.get(&object.id) {
                object.apply_override(ov);
            }
            object
        })
        .collect();
    Catalog::new(objects, now)
}

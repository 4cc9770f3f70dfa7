use std::sync::Arc;

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::VisibilityConfig;
use crate::propagation::{ElementSet, Observer, Propagator};

use super::pass_finder::compute_passes;
use super::types::VisibilityEvent;

/// Observer coordinates are quantized so that float noise does not defeat the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PassKey {
    object_id: String,
    lat_e4: i64,
    lng_e4: i64,
    altitude_m: i64,
}

impl PassKey {
    fn new(object_id: &str, observer: &Observer) -> Self {
        Self {
            object_id: object_id.to_string(),
            lat_e4: (observer.latitude_deg * 1e4).round() as i64,
            lng_e4: (observer.longitude_deg * 1e4).round() as i64,
            altitude_m: observer.altitude_m.round() as i64,
        }
    }
}

/// Pass predictions per (object, observer), cached for a short while since a
/// full scan costs a few thousand propagations.
pub struct VisibilityService {
    config: VisibilityConfig,
    propagator: Arc<dyn Propagator>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<PassKey, Vec<VisibilityEvent>>,
}

impl VisibilityService {
    pub fn new(
        config: VisibilityConfig,
        propagator: Arc<dyn Propagator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = TtlCache::new(config.pass_cache_ttl);
        Self {
            config,
            propagator,
            clock,
            cache,
        }
    }

    pub fn passes(
        &self,
        object_id: &str,
        elements: &ElementSet,
        observer: &Observer,
    ) -> Arc<Vec<VisibilityEvent>> {
        let now = self.clock.now();
        let key = PassKey::new(object_id, observer);
        if let Some(hit) = self.cache.get_fresh(&key, now) {
            return hit;
        }

        let passes = compute_passes(
            self.propagator.as_ref(),
            elements,
            observer,
            now,
            &self.config,
        );
        log::debug!(
            "{} passes of {} for observer {:.4},{:.4}",
            passes.len(),
            object_id,
            observer.latitude_deg,
            observer.longitude_deg
        );
        self.cache.purge_expired(now);
        self.cache.insert(key, passes, now)
    }
}

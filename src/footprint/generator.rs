use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::{FootprintConfig, RingStyle};
use crate::propagation::{geodetic_at, normalize_longitude, ElementSet, Propagator, EARTH_RADIUS_KM};

use super::geometry::{ring_coordinates, FootprintRadii};
use super::types::{FootprintMode, FootprintRing, RingType, VisibilityFootprint};

/// A newer element set for the same object never hits an older footprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FootprintKey {
    object_id: String,
    epoch_ms: i64,
    second: i64,
}

/// Builds ground-visibility footprints from one propagated position, or from
/// a fixed point when there is no orbit to work with.
pub struct FootprintGenerator {
    config: FootprintConfig,
    propagator: Arc<dyn Propagator>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<FootprintKey, VisibilityFootprint>,
}

impl FootprintGenerator {
    pub fn new(
        config: FootprintConfig,
        propagator: Arc<dyn Propagator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = TtlCache::new(config.cache_ttl);
        Self {
            config,
            propagator,
            clock,
            cache,
        }
    }

    /// With `elements`, the footprint is derived from the propagated position
    /// and a propagation failure yields `None`. Without `elements`, a static
    /// footprint is drawn around `static_point` (`(lat, lng)` degrees) if one
    /// is given.
    pub fn compute(
        &self,
        elements: Option<&ElementSet>,
        time: DateTime<Utc>,
        static_point: Option<(f64, f64)>,
    ) -> Option<Arc<VisibilityFootprint>> {
        match elements {
            Some(elements) => self.orbital(elements, time),
            None => static_point
                .and_then(|(lat, lng)| self.static_footprint(lat, lng))
                .map(Arc::new),
        }
    }

    fn orbital(&self, elements: &ElementSet, time: DateTime<Utc>) -> Option<Arc<VisibilityFootprint>> {
        let now = self.clock.now();
        let key = FootprintKey {
            object_id: elements.catalog_id(),
            epoch_ms: elements.epoch().timestamp_millis(),
            second: time.timestamp(),
        };
        if let Some(hit) = self.cache.get_fresh(&key, now) {
            return Some(hit);
        }

        let (state, geodetic) = match geodetic_at(self.propagator.as_ref(), elements, time) {
            Ok(fix) => fix,
            Err(e) => {
                debug!("No footprint for {} at {}: {}", elements.name, time, e);
                return None;
            }
        };

        let altitude_km = state.radius_km() - EARTH_RADIUS_KM;
        let radii = FootprintRadii::from_altitude(
            altitude_km,
            self.config.partial_elevation_deg,
            self.config.high_elevation_deg,
        )?;
        let footprint = self.build(
            FootprintMode::Orbital,
            geodetic.latitude_deg,
            geodetic.longitude_deg,
            Some(altitude_km),
            radii,
        );

        self.cache.purge_expired(now);
        Some(self.cache.insert(key, footprint, now))
    }

    fn static_footprint(&self, lat: f64, lng: f64) -> Option<VisibilityFootprint> {
        if !lat.is_finite() || !lng.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let radii = self.config.static_radii_deg;
        Some(self.build(
            FootprintMode::Static,
            lat,
            lng,
            None,
            FootprintRadii {
                horizon_deg: radii.horizon,
                partial_deg: radii.partial,
                high_deg: radii.high,
            },
        ))
    }

    fn build(
        &self,
        mode: FootprintMode,
        lat: f64,
        lng: f64,
        altitude_km: Option<f64>,
        radii: FootprintRadii,
    ) -> VisibilityFootprint {
        let styles = &self.config.styles;
        let ring = |ring_type, radius_deg: f64, style: &RingStyle| FootprintRing {
            ring_type,
            color: style.color.clone(),
            opacity: style.opacity,
            radius_deg,
            coordinates: ring_coordinates(lat, lng, radius_deg, self.config.segments),
        };

        VisibilityFootprint {
            mode,
            center: [normalize_longitude(lng), lat],
            altitude_km,
            rings: [
                ring(RingType::Horizon, radii.horizon_deg, &styles.horizon),
                ring(RingType::Partial, radii.partial_deg, &styles.partial),
                ring(RingType::High, radii.high_deg, &styles.high),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OrbitRegime;
    use crate::clock::FixedClock;
    use crate::footprint::geometry::central_angle_deg;
    use crate::propagation::fixtures::{iss, ScriptedPropagator, ISS_LINE2, ISS_NAME};
    use crate::propagation::{Geodetic, Sgp4Propagator};
    use chrono::{Duration, TimeZone};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 12, 30, 0).unwrap()
    }

    fn generator(propagator: Arc<dyn Propagator>) -> FootprintGenerator {
        FootprintGenerator::new(
            FootprintConfig::default(),
            propagator,
            Arc::new(FixedClock::new(at())),
        )
    }

    fn assert_ring_around(ring: &FootprintRing, center: [f64; 2]) {
        assert_eq!(ring.coordinates.len(), 61);
        assert_eq!(ring.coordinates.first(), ring.coordinates.last());
        for point in &ring.coordinates {
            let distance = central_angle_deg(center, *point);
            assert!(
                (distance - ring.radius_deg).abs() < 1e-6,
                "{:?} ring point {:?} is {} from centre",
                ring.ring_type,
                point,
                distance
            );
        }
    }

    #[test]
    fn iss_footprint_is_leo_sized_and_nested() {
        let set = iss();
        let footprint = generator(Arc::new(Sgp4Propagator))
            .compute(Some(&set), at(), None)
            .unwrap();

        assert_eq!(footprint.mode, FootprintMode::Orbital);
        let altitude = footprint.altitude_km.unwrap();
        assert_eq!(OrbitRegime::classify(altitude), OrbitRegime::Leo);

        let horizon = footprint.ring(RingType::Horizon);
        let partial = footprint.ring(RingType::Partial);
        let high = footprint.ring(RingType::High);
        assert!(horizon.radius_deg > partial.radius_deg);
        assert!(partial.radius_deg > high.radius_deg);
        // ISS horizon sits roughly 20 degrees of arc out
        assert!(horizon.radius_deg > 15.0 && horizon.radius_deg < 25.0);

        for ring in &footprint.rings {
            assert_ring_around(ring, footprint.center);
        }
    }

    #[test]
    fn rings_carry_configured_styles() {
        let set = iss();
        let footprint = generator(Arc::new(Sgp4Propagator))
            .compute(Some(&set), at(), None)
            .unwrap();
        let json = serde_json::to_value(&*footprint).unwrap();

        assert_eq!(json["mode"], "orbital");
        assert_eq!(json["rings"][0]["ringType"], "horizon");
        assert_eq!(json["rings"][1]["ringType"], "partial");
        assert_eq!(json["rings"][2]["ringType"], "high");
        assert_eq!(json["rings"][0]["color"], "#3b82f6");
        assert_eq!(json["rings"][2]["opacity"], 0.35);
    }

    #[test]
    fn propagation_failure_yields_none_even_with_static_point() {
        let generator = generator(Arc::new(ScriptedPropagator::new(|_| None)));
        assert!(generator
            .compute(Some(&iss()), at(), Some((10.0, 20.0)))
            .is_none());
    }

    #[test]
    fn decayed_object_yields_none() {
        let generator = generator(Arc::new(ScriptedPropagator::new(|_| {
            Some(Geodetic {
                latitude_deg: 0.0,
                longitude_deg: 0.0,
                altitude_km: -3.0,
            })
        })));
        assert!(generator.compute(Some(&iss()), at(), None).is_none());
    }

    #[test]
    fn static_point_uses_fixed_radii() {
        let generator = generator(Arc::new(Sgp4Propagator));
        let footprint = generator.compute(None, at(), Some((-20.0, 170.0))).unwrap();

        assert_eq!(footprint.mode, FootprintMode::Static);
        assert_eq!(footprint.center, [170.0, -20.0]);
        assert!(footprint.altitude_km.is_none());
        let radii: Vec<f64> = footprint.rings.iter().map(|r| r.radius_deg).collect();
        assert_eq!(radii, vec![30.0, 20.0, 10.0]);
        for ring in &footprint.rings {
            assert_ring_around(ring, footprint.center);
        }
    }

    #[test]
    fn nothing_usable_yields_none() {
        let generator = generator(Arc::new(Sgp4Propagator));
        assert!(generator.compute(None, at(), None).is_none());
        assert!(generator.compute(None, at(), Some((95.0, 0.0))).is_none());
        assert!(generator.compute(None, at(), Some((f64::NAN, 0.0))).is_none());
    }

    #[test]
    fn refreshed_elements_bypass_the_cached_footprint() {
        let generator = generator(Arc::new(Sgp4Propagator));
        let old = iss();
        let new = ElementSet::from_lines(
            Some(ISS_NAME.to_string()),
            "1 25544U 98067A   08265.51782528 -.00002182  00000-0 -11606-4 0  2928",
            ISS_LINE2,
        )
        .unwrap();
        assert_eq!(old.catalog_id(), new.catalog_id());

        let a = generator.compute(Some(&old), at(), None).unwrap();
        let b = generator.compute(Some(&new), at(), None).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.center, b.center);
    }

    #[test]
    fn footprints_are_cached_per_whole_second() {
        let generator = generator(Arc::new(Sgp4Propagator));
        let set = iss();

        let a = generator.compute(Some(&set), at(), None).unwrap();
        let b = generator
            .compute(Some(&set), at() + Duration::milliseconds(400), None)
            .unwrap();
        let c = generator
            .compute(Some(&set), at() + Duration::seconds(1), None)
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}

use chrono::{DateTime, Duration, Utc};

use crate::config::VisibilityConfig;
use crate::propagation::{geodetic_at, look_angles, ElementSet, Observer, Propagator};

use super::types::{Confidence, EventKind, VisibilityEvent};

const FALLBACK_STEP_SECONDS: i64 = 60;

struct OpenPass {
    start: DateTime<Utc>,
    peak: DateTime<Utc>,
    max_elevation_deg: f64,
}

impl OpenPass {
    fn open(at: DateTime<Utc>, elevation_deg: f64) -> Self {
        Self {
            start: at,
            peak: at,
            max_elevation_deg: elevation_deg,
        }
    }

    fn observe(&mut self, at: DateTime<Utc>, elevation_deg: f64) {
        // strictly greater: ties keep the earlier peak
        if elevation_deg > self.max_elevation_deg {
            self.max_elevation_deg = elevation_deg;
            self.peak = at;
        }
    }

    fn close(self, end: DateTime<Utc>) -> VisibilityEvent {
        VisibilityEvent {
            id: uuid::Uuid::new_v4().to_string(),
            start_time: self.start,
            peak_time: self.peak,
            end_time: end,
            duration_sec: (end - self.start).num_seconds(),
            max_elevation_deg: round2(self.max_elevation_deg),
            confidence: Confidence::from_max_elevation(self.max_elevation_deg),
            kind: EventKind::VisiblePass,
        }
    }
}

enum ScanState {
    NotVisible,
    Visible(OpenPass),
}

/// Scans `[now - lookback, now + lookahead]` at a fixed step and returns
/// every visible pass, earliest first. Samples that fail to propagate are
/// skipped without changing the scan state.
pub fn compute_passes(
    propagator: &dyn Propagator,
    elements: &ElementSet,
    observer: &Observer,
    now: DateTime<Utc>,
    config: &VisibilityConfig,
) -> Vec<VisibilityEvent> {
    let window_start = now - config.lookback;
    let window_end = now + config.lookahead;
    let step = if config.step > Duration::zero() {
        config.step
    } else {
        Duration::seconds(FALLBACK_STEP_SECONDS)
    };

    let mut passes = Vec::new();
    let mut state = ScanState::NotVisible;
    let mut cursor = window_start;

    while cursor <= window_end {
        if let Some(elevation) = elevation_at(propagator, elements, observer, cursor) {
            let visible = elevation >= config.min_elevation_deg;
            state = match (state, visible) {
                (ScanState::NotVisible, true) => ScanState::Visible(OpenPass::open(cursor, elevation)),
                (ScanState::Visible(mut pass), true) => {
                    pass.observe(cursor, elevation);
                    ScanState::Visible(pass)
                }
                (ScanState::Visible(pass), false) => {
                    passes.push(pass.close(cursor));
                    ScanState::NotVisible
                }
                (ScanState::NotVisible, false) => ScanState::NotVisible,
            };
        }
        cursor += step;
    }

    // Nothing is left open past the window.
    if let ScanState::Visible(pass) = state {
        passes.push(pass.close(window_end));
    }

    passes
}

fn elevation_at(
    propagator: &dyn Propagator,
    elements: &ElementSet,
    observer: &Observer,
    at: DateTime<Utc>,
) -> Option<f64> {
    match geodetic_at(propagator, elements, at) {
        Ok((_, geodetic)) => Some(look_angles(observer, &geodetic).elevation_deg),
        Err(e) => {
            log::trace!("{}: no sample at {}: {}", elements.name, at, e);
            None
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::fixtures::*;
    use crate::propagation::{Geodetic, Sgp4Propagator};
    use chrono::TimeZone;

    const NYC: (f64, f64) = (40.7128, -74.006);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap()
    }

    fn nyc() -> Observer {
        Observer::new(NYC.0, NYC.1, 0.0)
    }

    /// Ground track running north along a meridian offset from NYC by
    /// `lng_offset`, crossing NYC's latitude at `closest`. Far away otherwise.
    fn meridian_track(
        closest: DateTime<Utc>,
        lng_offset: f64,
    ) -> impl Fn(DateTime<Utc>) -> Option<Geodetic> + Send + Sync {
        move |t| {
            let minutes = (t - closest).num_seconds() as f64 / 60.0;
            if minutes.abs() <= 40.0 {
                Some(Geodetic {
                    latitude_deg: NYC.0 + minutes * 0.5,
                    longitude_deg: NYC.1 + lng_offset,
                    altitude_km: 500.0,
                })
            } else {
                Some(Geodetic {
                    latitude_deg: -NYC.0,
                    longitude_deg: NYC.1 + 180.0,
                    altitude_km: 500.0,
                })
            }
        }
    }

    #[test]
    fn overhead_crossing_yields_exactly_one_high_pass() {
        let closest = now() + Duration::hours(3);
        let propagator = ScriptedPropagator::new(meridian_track(closest, 0.0));
        let passes = compute_passes(
            &propagator,
            &iss(),
            &nyc(),
            now(),
            &VisibilityConfig::default(),
        );

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.peak_time, closest);
        assert!(pass.max_elevation_deg > 89.0);
        assert_eq!(pass.confidence, Confidence::High);
        assert_eq!(pass.kind, EventKind::VisiblePass);
        assert!(pass.start_time < closest && closest < pass.end_time);
        // the 10 degree crossing sits ~28 minutes either side of the peak
        assert!((pass.duration_sec - 56 * 60).abs() <= 4 * 60);
    }

    #[test]
    fn offset_track_is_classified_by_its_true_peak() {
        let closest = now() + Duration::hours(5);
        let propagator = ScriptedPropagator::new(meridian_track(closest, 6.25));
        let passes = compute_passes(
            &propagator,
            &iss(),
            &nyc(),
            now(),
            &VisibilityConfig::default(),
        );

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(pass.max_elevation_deg > 30.0 && pass.max_elevation_deg < 60.0);
        assert_eq!(pass.confidence, Confidence::Medium);
        assert!((pass.peak_time - closest).num_minutes().abs() <= 1);
    }

    #[test]
    fn flat_top_keeps_the_earliest_peak() {
        let closest = now() + Duration::hours(4);
        // hovers overhead from three minutes before to three minutes after
        let propagator = ScriptedPropagator::new(move |t: DateTime<Utc>| {
            let minutes = (t - closest).num_seconds() as f64 / 60.0;
            let off_top = minutes.signum() * (minutes.abs() - 3.0).max(0.0);
            let latitude_deg = if minutes.abs() <= 40.0 {
                NYC.0 + off_top * 0.5
            } else {
                -NYC.0
            };
            Some(Geodetic {
                latitude_deg,
                longitude_deg: if minutes.abs() <= 40.0 { NYC.1 } else { NYC.1 + 180.0 },
                altitude_km: 500.0,
            })
        });

        let passes = compute_passes(
            &propagator,
            &iss(),
            &nyc(),
            now(),
            &VisibilityConfig::default(),
        );
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].peak_time, closest - Duration::minutes(3));
    }

    #[test]
    fn propagation_gaps_do_not_split_a_pass() {
        let closest = now() + Duration::hours(2);
        let track = meridian_track(closest, 0.0);
        let gap_start = closest + Duration::minutes(5);
        let gap_end = closest + Duration::minutes(10);
        let propagator = ScriptedPropagator::new(move |t| {
            if t >= gap_start && t <= gap_end {
                None
            } else {
                track(t)
            }
        });

        let passes = compute_passes(
            &propagator,
            &iss(),
            &nyc(),
            now(),
            &VisibilityConfig::default(),
        );
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].peak_time, closest);
    }

    #[test]
    fn pass_still_open_at_window_end_is_closed_at_the_boundary() {
        let config = VisibilityConfig::default();
        let window_end = now() + config.lookahead;
        let propagator = ScriptedPropagator::new(meridian_track(window_end, 0.0));

        let passes = compute_passes(&propagator, &iss(), &nyc(), now(), &config);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].end_time, window_end);
        assert_eq!(passes[0].peak_time, window_end);
        assert_eq!(
            passes[0].duration_sec,
            (window_end - passes[0].start_time).num_seconds()
        );
    }

    #[test]
    fn never_visible_yields_nothing() {
        let propagator = ScriptedPropagator::new(|_| {
            Some(Geodetic {
                latitude_deg: -NYC.0,
                longitude_deg: NYC.1 + 180.0,
                altitude_km: 500.0,
            })
        });
        let passes = compute_passes(
            &propagator,
            &iss(),
            &nyc(),
            now(),
            &VisibilityConfig::default(),
        );
        assert!(passes.is_empty());
    }

    #[test]
    fn iss_passes_over_new_york_hold_their_invariants() {
        let config = VisibilityConfig::default();
        let set = iss();
        let passes = compute_passes(&Sgp4Propagator, &set, &nyc(), set.epoch(), &config);

        assert!(!passes.is_empty());
        for pass in &passes {
            assert!(pass.start_time <= pass.peak_time);
            assert!(pass.peak_time <= pass.end_time);
            assert_eq!(
                pass.duration_sec,
                (pass.end_time - pass.start_time).num_seconds()
            );
            assert!(pass.max_elevation_deg >= config.min_elevation_deg);
            assert_eq!(
                pass.confidence,
                Confidence::from_max_elevation(pass.max_elevation_deg)
            );
        }
        for pair in passes.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
    }

    #[test]
    fn scan_is_idempotent_apart_from_ids() {
        let config = VisibilityConfig::default();
        let set = iss();
        let strip = |mut events: Vec<VisibilityEvent>| {
            for event in &mut events {
                event.id.clear();
            }
            serde_json::to_string(&events).unwrap()
        };

        let a = compute_passes(&Sgp4Propagator, &set, &nyc(), set.epoch(), &config);
        let b = compute_passes(&Sgp4Propagator, &set, &nyc(), set.epoch(), &config);
        assert_ne!(a.first().map(|e| &e.id), b.first().map(|e| &e.id));
        assert_eq!(strip(a), strip(b));
    }
}

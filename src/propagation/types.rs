use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sgp4::Elements;

use super::error::PropagationError;

/// The raw two element lines, as published by the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementPair {
    pub line1: String,
    pub line2: String,
}

/// A parsed two-line element set.
#[derive(Debug, Clone)]
pub struct ElementSet {
    pub name: String,
    pub pair: ElementPair,
    pub elements: Elements,
}

impl ElementSet {
    pub fn from_lines(
        name: Option<String>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, PropagationError> {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("NORAD {}", elements.norad_id));

        Ok(Self {
            name,
            pair: ElementPair {
                line1: line1.to_string(),
                line2: line2.to_string(),
            },
            elements,
        })
    }

    /// Stable catalog id (the NORAD number).
    pub fn catalog_id(&self) -> String {
        self.elements.norad_id.to_string()
    }

    pub fn inclination_deg(&self) -> f64 {
        self.elements.inclination
    }

    /// Orbital period from the mean motion (rev/day).
    pub fn period_minutes(&self) -> f64 {
        if self.elements.mean_motion > 0.0 {
            1440.0 / self.elements.mean_motion
        } else {
            0.0
        }
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.elements.datetime)
    }
}

/// Inertial state vector in km and km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl EciState {
    pub fn radius_km(&self) -> f64 {
        norm(self.position_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        norm(self.velocity_km_s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::fixtures::*;

    #[test]
    fn parses_iss_element_set() {
        let set = iss();
        assert_eq!(set.catalog_id(), "25544");
        assert_eq!(set.name, ISS_NAME);
        assert!((set.inclination_deg() - 51.6416).abs() < 1e-9);
        assert!((set.period_minutes() - 91.59).abs() < 0.01);
        assert_eq!(set.pair.line1, ISS_LINE1);
        assert_eq!(set.epoch().format("%Y-%m-%d").to_string(), "2008-09-20");
    }

    #[test]
    fn unnamed_set_falls_back_to_norad_label() {
        let set = ElementSet::from_lines(None, GPS_LINE1, GPS_LINE2).unwrap();
        assert_eq!(set.name, "NORAD 24876");
    }

    #[test]
    fn corrupted_line_is_rejected() {
        let broken = ISS_LINE2.replace("51.6416", "5x.6416");
        assert!(ElementSet::from_lines(None, ISS_LINE1, &broken).is_err());
    }
}

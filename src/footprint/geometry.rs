use crate::propagation::{normalize_longitude, EARTH_RADIUS_KM};

/// Angular radii (degrees of arc from the sub-satellite point) of the three
/// visibility rings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintRadii {
    pub horizon_deg: f64,
    pub partial_deg: f64,
    pub high_deg: f64,
}

impl FootprintRadii {
    /// Radii for an object `altitude_km` above a spherical Earth. `None` for
    /// non-positive or non-finite altitudes.
    pub fn from_altitude(
        altitude_km: f64,
        partial_elevation_deg: f64,
        high_elevation_deg: f64,
    ) -> Option<Self> {
        if !altitude_km.is_finite() || altitude_km <= 0.0 {
            return None;
        }
        let k = EARTH_RADIUS_KM / (EARTH_RADIUS_KM + altitude_km);
        Some(Self {
            horizon_deg: k.acos().to_degrees(),
            partial_deg: arc_at_elevation(k, partial_elevation_deg),
            high_deg: arc_at_elevation(k, high_elevation_deg),
        })
    }
}

// Earth-central angle at which the object sits `elevation_deg` above the
// local horizon: gamma = acos(k cos el) - el.
fn arc_at_elevation(k: f64, elevation_deg: f64) -> f64 {
    let el = elevation_deg.to_radians();
    ((k * el.cos()).acos() - el).max(0.0).to_degrees()
}

/// Point reached from `(lat, lng)` after travelling `distance_deg` of arc
/// along `bearing_rad`. Returns `[longitude, latitude]` in degrees.
pub fn destination_point(lat_deg: f64, lng_deg: f64, distance_deg: f64, bearing_rad: f64) -> [f64; 2] {
    let phi1 = lat_deg.to_radians();
    let lambda1 = lng_deg.to_radians();
    let delta = distance_deg.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing_rad.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (bearing_rad.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    [normalize_longitude(lambda2.to_degrees()), phi2.to_degrees()]
}

/// Closed ring of `segments + 1` points; the last equals the first.
pub(crate) fn ring_coordinates(lat_deg: f64, lng_deg: f64, radius_deg: f64, segments: usize) -> Vec<[f64; 2]> {
    let segments = segments.max(3);
    let mut coordinates: Vec<[f64; 2]> = (0..segments)
        .map(|i| {
            let bearing = std::f64::consts::TAU * i as f64 / segments as f64;
            destination_point(lat_deg, lng_deg, radius_deg, bearing)
        })
        .collect();
    coordinates.push(coordinates[0]);
    coordinates
}

#[cfg(test)]
pub(crate) fn central_angle_deg(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lng1, lat1) = (a[0].to_radians(), a[1].to_radians());
    let (lng2, lat2) = (b[0].to_radians(), b[1].to_radians());
    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lng2 - lng1) / 2.0).sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

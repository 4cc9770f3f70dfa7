use super::{Geodetic, Observer};

// WGS-84
const WGS84_A_KM: f64 = 6378.137;
const WGS84_E2: f64 = 0.006_694_379_990_14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

/// Rotates a TEME position into the Earth-fixed frame.
pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

pub fn geodetic_to_ecef_km(geodetic: &Geodetic) -> [f64; 3] {
    let lat = geodetic.latitude_deg.to_radians();
    let lon = geodetic.longitude_deg.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let h = geodetic.altitude_km;
    [
        (n + h) * cos_lat * lon.cos(),
        (n + h) * cos_lat * lon.sin(),
        (n * (1.0 - WGS84_E2) + h) * sin_lat,
    ]
}

/// Iterative ECEF to geodetic conversion on the WGS-84 ellipsoid.
pub fn ecef_to_geodetic(pos: [f64; 3]) -> Geodetic {
    let r = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
    let longitude = pos[1].atan2(pos[0]);
    let mut latitude = pos[2].atan2(r);
    let mut c = 1.0;

    for _ in 0..20 {
        let sin_lat = latitude.sin();
        c = 1.0 / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let next = (pos[2] + WGS84_A_KM * c * WGS84_E2 * sin_lat).atan2(r);
        let converged = (next - latitude).abs() < 1e-12;
        latitude = next;
        if converged {
            break;
        }
    }

    let altitude_km = if latitude.cos().abs() > 1e-9 {
        r / latitude.cos() - WGS84_A_KM * c
    } else {
        // polar axis
        pos[2].abs() - WGS84_A_KM * c * (1.0 - WGS84_E2)
    };

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: normalize_longitude(longitude.to_degrees()),
        altitude_km,
    }
}

/// Wraps a longitude into [-180, 180).
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    (lon_deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Azimuth, elevation and range of `target` as seen by `observer`.
pub fn look_angles(observer: &Observer, target: &Geodetic) -> LookAngles {
    let sta = observer.position_ecef_km();
    let sat = geodetic_to_ecef_km(target);
    let dr = [sat[0] - sta[0], sat[1] - sta[1], sat[2] - sta[2]];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let enu = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let azimuth_deg = enu.0.atan2(enu.1).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (enu.2 / range_km).asin().to_degrees()
    } else {
        90.0
    };

    LookAngles {
        azimuth_deg,
        elevation_deg,
        range_km,
    }
}

mod error;
mod frames;
mod observer;
mod sgp4_propagator;
mod types;

pub use error::PropagationError;
pub use frames::{look_angles, normalize_longitude};
pub use observer::Observer;
pub use sgp4_propagator::Sgp4Propagator;
pub use types::{ElementSet, EciState, Geodetic};

use chrono::{DateTime, Utc};

/// Mean Earth radius used for the spherical approximations (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Standard gravitational parameter of the Earth (km^3/s^2).
pub const EARTH_MU_KM3_S2: f64 = 398_600.4418;

/// Orbit propagation primitive. Any SGP4-compliant implementation works.
pub trait Propagator: Send + Sync {
    /// Position and velocity in the Earth-centred inertial frame at `time`.
    fn propagate_to_eci(
        &self,
        elements: &ElementSet,
        time: DateTime<Utc>,
    ) -> Result<EciState, PropagationError>;

    /// Geodetic coordinates of an inertial position at `time`.
    fn eci_to_geodetic(&self, position_km: [f64; 3], time: DateTime<Utc>) -> Geodetic;
}

/// Propagates and converts in one go; rejects positions under the surface.
pub fn geodetic_at(
    propagator: &dyn Propagator,
    elements: &ElementSet,
    time: DateTime<Utc>,
) -> Result<(EciState, Geodetic), PropagationError> {
    let state = propagator.propagate_to_eci(elements, time)?;
    let geodetic = propagator.eci_to_geodetic(state.position_km, time);
    if geodetic.altitude_km <= 0.0 || !geodetic.altitude_km.is_finite() {
        return Err(PropagationError::BelowSurface {
            altitude_km: geodetic.altitude_km,
        });
    }
    Ok((state, geodetic))
}

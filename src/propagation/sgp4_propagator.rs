use chrono::{DateTime, Utc};
use sgp4::Constants;

use super::frames::{ecef_to_geodetic, teme_to_ecef_position};
use super::{EciState, ElementSet, Geodetic, PropagationError, Propagator};

/// `Propagator` backed by the `sgp4` crate. Positions are in the TEME frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sgp4Propagator;

impl Sgp4Propagator {
    fn gmst(time: DateTime<Utc>) -> f64 {
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&time.naive_utc()))
    }
}

impl Propagator for Sgp4Propagator {
    fn propagate_to_eci(
        &self,
        elements: &ElementSet,
        time: DateTime<Utc>,
    ) -> Result<EciState, PropagationError> {
        let constants = Constants::from_elements(&elements.elements)?;
        let minutes = elements
            .elements
            .datetime_to_minutes_since_epoch(&time.naive_utc())
            .map_err(|e| PropagationError::Epoch(e.to_string()))?;
        let prediction = constants.propagate(minutes)?;

        let state = EciState {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        };
        if !state.radius_km().is_finite() {
            return Err(PropagationError::Propagation(
                "non-finite state vector".to_string(),
            ));
        }
        Ok(state)
    }

    fn eci_to_geodetic(&self, position_km: [f64; 3], time: DateTime<Utc>) -> Geodetic {
        ecef_to_geodetic(teme_to_ecef_position(position_km, Self::gmst(time)))
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("epoch error: {0}")]
    Epoch(String),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("object is below the surface ({altitude_km:.1} km)")]
    BelowSurface { altitude_km: f64 },
}

impl From<sgp4::Error> for PropagationError {
    fn from(err: sgp4::Error) -> Self {
        PropagationError::Propagation(err.to_string())
    }
}

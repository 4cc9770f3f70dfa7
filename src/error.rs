use thiserror::Error;

use crate::propagation::PropagationError;

/// Failures that reach the caller of the tracking service.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("object {0} not found in live telemetry or the catalog")]
    NotFound(String),
    #[error("object {id} could not be propagated: {source}")]
    Propagation {
        id: String,
        #[source]
        source: PropagationError,
    },
}

/// Failures while wiring the service together at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("catalog client error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
    #[error("telemetry client error: {0}")]
    Telemetry(#[from] crate::resolver::TelemetryError),
}

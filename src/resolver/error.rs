use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telemetry API answered with status {0}")]
    Status(u16),
    #[error("telemetry API returned no position")]
    NoFix,
    #[error("telemetry API timed out")]
    Timeout,
}

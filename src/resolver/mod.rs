mod error;
mod resolver;
mod telemetry;
mod types;

pub use error::TelemetryError;
pub use resolver::PositionResolver;
pub use telemetry::{N2yoClient, TelemetryClient};
pub use types::PositionRecord;
#[cfg(test)]
pub use types::PositionSource;

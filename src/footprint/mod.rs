mod generator;
mod geometry;
mod types;

pub use generator::FootprintGenerator;
pub use types::VisibilityFootprint;
#[cfg(test)]
pub use types::FootprintMode;

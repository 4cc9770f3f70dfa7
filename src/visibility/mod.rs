mod pass_finder;
mod service;
mod types;

pub use service::VisibilityService;
pub use types::VisibilityEvent;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source {source_name} answered with status {status}")]
    Status { source_name: String, status: u16 },
    #[error("source {source_name} timed out after {after_secs}s")]
    Timeout { source_name: String, after_secs: i64 },
    #[error("every catalog source failed")]
    AllSourcesFailed,
    #[error("catalog sources yielded no usable objects")]
    NoObjects,
}

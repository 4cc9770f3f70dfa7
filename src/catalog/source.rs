use chrono::Duration;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;

use super::error::CatalogError;
use super::types::Category;

/// One upstream element-set feed.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category: Category,
    #[serde(
        default = "crate::config::default_source_timeout",
        deserialize_with = "crate::config::deserialize_duration"
    )]
    pub timeout: Duration,
}

/// Retrieves the raw element-set text of a source.
pub trait SourceFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        source: &CatalogSource,
    ) -> impl Future<Output = Result<String, CatalogError>> + Send;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("orbitwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, source: &CatalogSource) -> Result<String, CatalogError> {
        let response = self.client.get(&source.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                source_name: source.name.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

use crate::catalog::error::CatalogError;
use crate::catalog::types::SatelliteGroup;

pub const CELESTRAK_GP_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";

/// A single request against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    CatalogNumber(String),
    Group(SatelliteGroup),
}

impl CatalogQuery {
    pub fn params(&self) -> [(&'static str, String); 2] {
        match self {
            CatalogQuery::CatalogNumber(id) => [("CATNR", id.clone()), ("FORMAT", "json".into())],
            CatalogQuery::Group(group) => [("GROUP", group.to_string()), ("FORMAT", "json".into())],
        }
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogQuery::CatalogNumber(id) => write!(f, "CATNR={}", id),
            CatalogQuery::Group(group) => write!(f, "GROUP={}", group),
        }
    }
}

/// Anything that can answer catalog queries with a raw response body.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, query: &CatalogQuery) -> Result<String, CatalogError>;
}

/// Celestrak GP endpoint over HTTP
pub struct CelestrakSource {
    client: Client,
    base_url: String,
}

impl CelestrakSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogSource for CelestrakSource {
    async fn fetch(&self, query: &CatalogQuery) -> Result<String, CatalogError> {
        log::debug!("GET {}?{}", self.base_url, query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&query.params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

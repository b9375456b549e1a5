//! HTTP-backed candidate source

use super::{candidates_from_discovery, candidates_from_registry, check_alternate};
use super::{Candidate, CandidateSource};
use crate::config::{ResourceType, SourceUrls};
use crate::error::{Result, SourceError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// Fetches registry and discovery documents over HTTP
pub struct HttpSource {
    /// HTTP client
    client: reqwest::Client,
    /// URL templates
    urls: SourceUrls,
}

impl HttpSource {
    /// Create a new source
    pub fn new(urls: SourceUrls) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(SourceError::from)?;

        Ok(Self { client, urls })
    }

    /// GET a JSON document, mapping non-200 and undecodable bodies to
    /// source errors
    async fn fetch_json(&self, url: &str) -> std::result::Result<Value, SourceError> {
        tracing::info!("Using {}", url);

        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(SourceError::Unavailable {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl CandidateSource for HttpSource {
    async fn fetch(
        &self,
        chain: &str,
        resource: ResourceType,
        alternate: bool,
    ) -> Result<Vec<Candidate>> {
        check_alternate(resource, alternate)?;

        let candidates = if alternate {
            let doc = self.fetch_json(&self.urls.discovery_url(chain)).await?;
            candidates_from_discovery(&doc)?
        } else {
            let doc = self.fetch_json(&self.urls.registry_url(chain)).await?;
            candidates_from_registry(&doc, resource)?
        };

        tracing::debug!("Fetched {} {} candidates for {}", candidates.len(), resource, chain);
        Ok(candidates)
    }
}

use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use overview_core::Endpoint;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Capability the view model fetches through. One GET, one JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, endpoint: &Endpoint) -> std::result::Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parse base url {base_url}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("base url {base_url} cannot carry a path");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { base, client })
    }

    /// Joins the endpoint onto the base url. Segments and query values are
    /// percent-encoded; a path prefix on the base is kept.
    pub fn url_for(&self, endpoint: &Endpoint) -> std::result::Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        let query = endpoint.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, endpoint: &Endpoint) -> std::result::Result<Value, FetchError> {
        let url = self.url_for(endpoint)?;
        tracing::trace!(%url, "GET");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(endpoint, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::status(endpoint, status.as_u16()));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::transport(endpoint, e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::body(endpoint, e.to_string()))
    }
}

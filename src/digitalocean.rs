//! DigitalOcean API client for domain record operations
//!
//! Uses reqwest with rustls for HTTP requests.

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;
use tracing::debug;
use urlencoding::encode;

use crate::constants::{
    HTTP_STATUS_FORBIDDEN, HTTP_STATUS_TOO_MANY_REQUESTS, HTTP_STATUS_UNAUTHORIZED, USER_AGENT,
};
use crate::dns_provider::{DnsProvider, DomainRecord, RecordList, RecordResponse};
use crate::metrics;

//==============================================================================
// Types
//==============================================================================

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    id: String,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.message)
    }
}

//==============================================================================
// Client
//==============================================================================

pub struct DigitalOceanClient {
    api_base: String,
    client: reqwest::Client,
}

impl DigitalOceanClient {
    /// Builds a client for `api_base` (e.g. `https://api.digitalocean.com/v2/domains/`)
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self::from_reqwest(api_base, client))
    }

    /// Wraps an already configured reqwest client
    pub fn from_reqwest(api_base: &str, client: reqwest::Client) -> Self {
        let mut api_base = api_base.to_string();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        Self { api_base, client }
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}{}/records", self.api_base, encode(domain))
    }

    fn record_url(&self, domain: &str, id: u64) -> String {
        format!("{}/{}", self.records_url(domain), id)
    }
}

/// Turns a non-success response into an error carrying the provider's message
async fn ensure_success(resp: Response, action: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.to_string())
        .unwrap_or_else(|_| body.trim().to_string());

    match status.as_u16() {
        HTTP_STATUS_UNAUTHORIZED | HTTP_STATUS_FORBIDDEN => {
            bail!("{} rejected, check the API key ({}): {}", action, status, detail)
        }
        HTTP_STATUS_TOO_MANY_REQUESTS => bail!("{} failed: rate limited by DigitalOcean", action),
        _ if status.is_server_error() => {
            bail!("{} failed: DigitalOcean server error: {}", action, status.as_u16())
        }
        _ => bail!("{} failed ({}): {}", action, status, detail),
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanClient {
    async fn list_records(&self, domain: &str, api_key: &str) -> Result<RecordList> {
        let url = self.records_url(domain);
        let _timer = metrics::start_request_timer("list");

        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .context("GET request failed")?;
        let resp = ensure_success(resp, "List records").await?;
        resp.json().await.context("Failed to parse record list")
    }

    async fn create_record(
        &self,
        domain: &str,
        api_key: &str,
        record: &DomainRecord,
    ) -> Result<DomainRecord> {
        let url = self.records_url(domain);
        let _timer = metrics::start_request_timer("create");

        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(record)
            .send()
            .await
            .context("POST request failed")?;
        let resp = ensure_success(resp, "Create").await?;
        let body: RecordResponse = resp.json().await.context("Failed to parse response")?;
        Ok(body.record)
    }

    async fn update_record(
        &self,
        domain: &str,
        api_key: &str,
        id: u64,
        record: &DomainRecord,
    ) -> Result<DomainRecord> {
        let url = self.record_url(domain, id);
        let _timer = metrics::start_request_timer("update");

        debug!("PUT {}", url);
        let resp = self
            .client
            .put(&url)
            .bearer_auth(api_key)
            .json(record)
            .send()
            .await
            .context("PUT request failed")?;
        let resp = ensure_success(resp, "Update").await?;
        let body: RecordResponse = resp.json().await.context("Failed to parse response")?;
        Ok(body.record)
    }

    async fn delete_record(&self, domain: &str, api_key: &str, id: u64) -> Result<()> {
        let url = self.record_url(domain, id);
        let _timer = metrics::start_request_timer("delete");

        debug!("DELETE {}", url);
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .context("DELETE request failed")?;
        ensure_success(resp, "Delete").await?;
        Ok(())
    }
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = DigitalOceanClient::from_reqwest(
            "https://api.digitalocean.com/v2/domains",
            reqwest::Client::new(),
        );
        assert_eq!(
            client.records_url("example.org"),
            "https://api.digitalocean.com/v2/domains/example.org/records"
        );
        assert_eq!(
            client.record_url("example.org", 3352896),
            "https://api.digitalocean.com/v2/domains/example.org/records/3352896"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err: ApiError =
            serde_json::from_str(r#"{"id":"unauthorized","message":"Unable to authenticate you."}"#)
                .unwrap();
        assert_eq!(err.to_string(), "[unauthorized] Unable to authenticate you.");
    }
}

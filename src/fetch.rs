//! HTTP access for the harvesting pipeline
//!
//! One blocking client shared by every source, with bounded timeouts on
//! each outbound call. Errors carry the URL they failed on and are
//! always treated as source-local by callers.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header;
use serde_json::Value;

use crate::error::HarvestError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("repo-harvester/", env!("CARGO_PKG_VERSION"));

/// A fetched HTML page together with its `Link` response header
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub link_header: Option<String>,
}

/// Blocking HTTP client wrapper
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, HarvestError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HarvestError::Client(e.to_string()))?;
        Ok(Fetcher { client })
    }

    /// Fetch a page, keeping the `Link` header for signposting discovery
    pub fn get_page(&self, url: &str) -> Result<FetchedPage, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| network_error(url, e))?;

        let link_header = response
            .headers()
            .get(header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().map_err(|e| network_error(url, e))?;

        Ok(FetchedPage { body, link_header })
    }

    /// GET a document body as text, with an optional Accept header
    pub fn get_text(&self, url: &str, accept: Option<&str>) -> Result<String, HarvestError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(header::ACCEPT, accept);
        }
        request
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| network_error(url, e))
    }

    /// GET a JSON document
    pub fn get_json(&self, url: &str) -> Result<Value, HarvestError> {
        self.client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Value>())
            .map_err(|e| network_error(url, e))
    }

    /// POST a JSON payload, optionally bearer-authenticated, returning JSON
    pub fn post_json(
        &self,
        url: &str,
        payload: &Value,
        bearer: Option<&str>,
    ) -> Result<Value, HarvestError> {
        let mut request = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(payload);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Value>())
            .map_err(|e| network_error(url, e))
    }
}

fn network_error(url: &str, err: reqwest::Error) -> HarvestError {
    HarvestError::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

use std::time::Duration;

use ruleboard_protocol::{
    CatalogResult, Envelope, RowsQuery, RowsResult, SubmitRequest, SubmitResult,
};

/// Rule service API client (blocking).
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

/// Error type for rule service operations.
#[derive(Debug)]
pub enum ClientError {
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Server returned a validation error (4xx with message)
    Validation(String),
    /// Server acknowledged the submit with a failure
    Rejected(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ClientError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ClientError::Validation(msg) => write!(f, "{}", msg),
            ClientError::Rejected(msg) => write!(f, "Submit rejected: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl CatalogClient {
    /// Create a new client for a service base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("rboard/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the device and data-type catalogs. Called once per editor
    /// lifecycle.
    pub fn fetch_catalog(&self) -> Result<CatalogResult, ClientError> {
        let url = format!("{}/formula", self.base_url);
        log::debug!("GET {}", url);
        let resp = self.get(&url)?;
        let envelope: Envelope<CatalogResult> =
            resp.json().map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(envelope.result)
    }

    /// Fetch the seed rows for one device/type pair.
    pub fn fetch_rows(&self, device: &str, data_type: &str) -> Result<RowsResult, ClientError> {
        let url = format!("{}/formula", self.base_url);
        let query = RowsQuery {
            device: device.to_string(),
            data_type: data_type.to_string(),
        };
        log::debug!("POST {} device={} type={}", url, device, data_type);
        let resp = self.post_json(&url, &query)?;
        let envelope: Envelope<RowsResult> =
            resp.json().map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(envelope.result)
    }

    /// Push the edited data set. No retry: a failure is reported as-is and
    /// the caller's collections stay untouched.
    pub fn submit(&self, request: &SubmitRequest) -> Result<(), ClientError> {
        let url = format!("{}/formula/submit", self.base_url);
        log::debug!(
            "POST {} ({} conditions, {} formulas)",
            url,
            request.if_symbols.len(),
            request.formulas.len()
        );
        let resp = self.post_json(&url, request)?;
        let envelope: Envelope<SubmitResult> =
            resp.json().map_err(|e| ClientError::Parse(e.to_string()))?;
        if envelope.result.ok {
            Ok(())
        } else {
            Err(ClientError::Rejected(
                envelope.result.message.unwrap_or_default(),
            ))
        }
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::check_status(response)
    }

    fn post_json<B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::check_status(response)
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            if status == 422 || status == 400 {
                return Err(ClientError::Validation(body));
            }
            return Err(ClientError::Http(status, body));
        }
        Ok(response)
    }
}

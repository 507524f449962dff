use reqwest::{Client, StatusCode};

use crate::config::UpstreamConfig;
use crate::error::{AppError, Result};

/// A status page as returned by the vendor endpoint.
#[derive(Debug, Clone)]
pub struct StatusPage {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP client for the vendor status pages, one page per serial number.
#[derive(Debug, Clone)]
pub struct StatusClient {
    http: Client,
    base_url: String,
}

impl StatusClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn status_url(&self, serial: &str) -> String {
        format!("{}/{}", self.base_url, serial)
    }

    /// Fetch the status page for `serial`. Any HTTP status is returned as a
    /// page; only transport failures (timeouts, refused connections, DNS)
    /// are errors.
    pub async fn fetch(&self, serial: &str) -> std::result::Result<StatusPage, reqwest::Error> {
        let response = self.http.get(self.status_url(serial)).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(StatusPage { status, body })
    }
}

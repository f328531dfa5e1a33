use std::future::Future;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::types::ScanRequest;

/// Status and raw body of a scanning service reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    pub body: String,
}

impl ServiceReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The remote scanning service.
///
/// An `Err` means no reply arrived at all (connection refused, timeout, reset).
/// Any HTTP reply, including error statuses, is returned as `Ok`.
pub trait ScanService: Send + Sync + 'static {
    fn scan_host(&self, request: &ScanRequest)
        -> impl Future<Output = Result<ServiceReply>> + Send;

    fn scan_network(&self) -> impl Future<Output = Result<ServiceReply>> + Send;
}

/// `ScanService` over HTTP with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpScanService {
    client: reqwest::Client,
    config: ConsoleConfig,
}

impl HttpScanService {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("scan-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    async fn read_reply(url: &str, response: reqwest::Response) -> Result<ServiceReply> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read reply body from {url}"))?;
        debug!(%url, status, bytes = body.len(), "scanner replied");
        Ok(ServiceReply { status, body })
    }
}

impl ScanService for HttpScanService {
    async fn scan_host(&self, request: &ScanRequest) -> Result<ServiceReply> {
        let url = self.config.host_scan_url();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        Self::read_reply(&url, response).await
    }

    async fn scan_network(&self) -> Result<ServiceReply> {
        let url = self.config.network_scan_url();
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        Self::read_reply(&url, response).await
    }
}

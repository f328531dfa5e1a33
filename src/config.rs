use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Where the scanning service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the scanning service, e.g. `http://127.0.0.1:3000`.
    pub server: String,
    /// Whole-request timeout. A scan reply can take a while for slow hosts.
    pub timeout: Duration,
    pub host_scan_path: String,
    pub network_scan_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            host_scan_path: "/scan".to_string(),
            network_scan_path: "/scan_network".to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn new(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
            ..Self::default()
        }
    }

    /// Join the server base and an endpoint path with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn host_scan_url(&self) -> String {
        self.endpoint(&self.host_scan_path)
    }

    pub fn network_scan_url(&self) -> String {
        self.endpoint(&self.network_scan_path)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.server)
            .with_context(|| format!("invalid server URL: {}", self.server))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("server URL must be http or https: {}", self.server);
        }
        if self.timeout.is_zero() {
            bail!("request timeout must be greater than zero");
        }
        Ok(())
    }
}

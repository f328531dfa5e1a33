use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Body of a host scan request (`POST /scan`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
}

impl ScanRequest {
    /// Build a request from raw operator input.
    ///
    /// The target is trimmed; `None` when nothing is left.
    pub fn from_input(input: &str) -> Option<Self> {
        let target = input.trim();
        if target.is_empty() {
            return None;
        }
        Some(Self {
            target: target.to_string(),
        })
    }
}

/// Success body of `POST /scan` as sent by the scanning service.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct HostScanResponse {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub results: Option<Vec<RawPortEntry>>,
}

/// One probed port in a host scan reply.
#[derive(Deserialize, Debug, Clone)]
pub struct RawPortEntry {
    pub port: u32,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub banner: Option<String>,
}

/// Success body of `POST /scan_network`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct NetworkScanResponse {
    #[serde(default)]
    pub hosts: Option<Vec<RawHostEntry>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawHostEntry {
    pub ip: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Error body returned with a non-success status. The field is best-effort.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Open,
    Closed,
}

/// Canonical record for one scanned port.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub port: u16,
    pub service: String,
    pub status: PortStatus,
    /// Status text exactly as the service reported it.
    pub status_label: String,
    pub banner: Option<String>,
}

/// Canonical record for one discovered host.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub ip: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_self: bool,
}

/// Aggregates derived from a host scan.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total_probed: usize,
    pub open_count: usize,
    pub elapsed_ms: u64,
}

/// Normalized result of a successful host scan.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostScanReport {
    pub target: String,
    pub ip: String,
    pub records: Vec<PortRecord>,
    pub stats: ScanStats,
}

/// The single result of one completed request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Ports(HostScanReport),
    Hosts { hosts: Vec<HostRecord> },
    Failure { error: ScanError },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Host,
    Subnet,
}

impl SessionKind {
    pub const ALL: [SessionKind; 2] = [SessionKind::Host, SessionKind::Subnet];

    /// Control label while no request is in flight.
    pub fn idle_label(self) -> &'static str {
        match self {
            SessionKind::Host => "Initialize Scan",
            SessionKind::Subnet => "Scan Network",
        }
    }

    /// Control label while a request is in flight.
    pub fn busy_label(self) -> &'static str {
        match self {
            SessionKind::Host => "Scanning...",
            SessionKind::Subnet => "Scanning Subnet...",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Host => f.write_str("host"),
            SessionKind::Subnet => f.write_str("subnet"),
        }
    }
}

/// Lifecycle of one session.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    #[default]
    Idle,
    Scanning,
    ShowingResults,
    ShowingError,
}

impl UiState {
    pub fn is_terminal(self) -> bool {
        matches!(self, UiState::ShowingResults | UiState::ShowingError)
    }
}

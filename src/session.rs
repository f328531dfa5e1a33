//! Request lifecycle for one scan session.
//!
//! A session moves `Idle -> Scanning -> ShowingResults | ShowingError` and back
//! to `Scanning` on every accepted submit. Each submit bumps the session's
//! generation; a reply is applied only while its generation is still current,
//! so the newest request is authoritative even when replies arrive out of order.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::ScanService;
use crate::console::ConsoleState;
use crate::error::ScanError;
use crate::normalize::{decode_host_reply, decode_network_reply};
use crate::types::{ScanOutcome, ScanRequest, ScanStats, SessionKind, UiState};

/// State of the button that triggers a session.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub label: &'static str,
}

impl ControlState {
    pub fn idle(kind: SessionKind) -> Self {
        Self {
            enabled: true,
            label: kind.idle_label(),
        }
    }

    pub fn busy(kind: SessionKind) -> Self {
        Self {
            enabled: false,
            label: kind.busy_label(),
        }
    }
}

/// Display state owned by one session.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: UiState,
    pub generation: u64,
    pub control: ControlState,
    /// Status line above the table.
    pub header: Option<String>,
    /// Host sessions only.
    pub stats: Option<ScanStats>,
    pub outcome: Option<ScanOutcome>,
}

impl SessionState {
    pub fn new(kind: SessionKind) -> Self {
        Self {
            phase: UiState::Idle,
            generation: 0,
            control: ControlState::idle(kind),
            header: None,
            stats: baseline_stats(kind),
            outcome: None,
        }
    }

    /// Reset the display and mark the session in flight. Returns the new generation.
    pub(crate) fn begin(&mut self, kind: SessionKind, request: Option<&ScanRequest>) -> u64 {
        self.generation += 1;
        self.phase = UiState::Scanning;
        self.outcome = None;
        self.stats = baseline_stats(kind);
        self.control = ControlState::busy(kind);
        self.header = request.map(|r| format!("Scanning: {}...", r.target));
        self.generation
    }

    /// Apply the outcome of request `generation`, unless a newer request superseded it.
    pub(crate) fn finish(
        &mut self,
        kind: SessionKind,
        generation: u64,
        outcome: ScanOutcome,
    ) -> RunOutcome {
        if generation != self.generation {
            return RunOutcome::Superseded;
        }
        match &outcome {
            ScanOutcome::Ports(report) => {
                self.phase = UiState::ShowingResults;
                self.stats = Some(report.stats);
                self.header = Some(format!("Target: {} ({})", report.target, report.ip));
            }
            ScanOutcome::Hosts { hosts } => {
                self.phase = UiState::ShowingResults;
                self.header = Some(match hosts.len() {
                    1 => "1 active device found".to_string(),
                    n => format!("{n} active devices found"),
                });
            }
            ScanOutcome::Failure { .. } => {
                self.phase = UiState::ShowingError;
                self.header = match kind {
                    SessionKind::Host => Some("Scan Failed".to_string()),
                    SessionKind::Subnet => None,
                };
            }
        }
        self.outcome = Some(outcome);
        self.control = ControlState::idle(kind);
        RunOutcome::Applied(self.phase)
    }

    pub fn error(&self) -> Option<&ScanError> {
        match &self.outcome {
            Some(ScanOutcome::Failure { error }) => Some(error),
            _ => None,
        }
    }
}

fn baseline_stats(kind: SessionKind) -> Option<ScanStats> {
    match kind {
        SessionKind::Host => Some(ScanStats::default()),
        SessionKind::Subnet => None,
    }
}

/// What a session is asked to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    /// Raw target text; trimmed before submission.
    Host(String),
    Network,
}

impl ScanPayload {
    pub fn kind(&self) -> SessionKind {
        match self {
            ScanPayload::Host(_) => SessionKind::Host,
            ScanPayload::Network => SessionKind::Subnet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to submit; no request was issued.
    Refused,
    /// The reply was applied and left the session in this phase.
    Applied(UiState),
    /// A newer request started before this one replied; its reply was dropped.
    Superseded,
}

/// Drives one session against the scanning service.
pub struct SessionController<S> {
    kind: SessionKind,
    state: Arc<RwLock<ConsoleState>>,
    service: Arc<S>,
}

impl<S: ScanService> SessionController<S> {
    pub fn new(kind: SessionKind, state: Arc<RwLock<ConsoleState>>, service: Arc<S>) -> Self {
        Self {
            kind,
            state,
            service,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub async fn run(&self, payload: ScanPayload) -> RunOutcome {
        if payload.kind() != self.kind {
            warn!(session = %self.kind, payload = %payload.kind(), "payload for another session");
            return RunOutcome::Refused;
        }
        let request = match &payload {
            ScanPayload::Host(input) => match ScanRequest::from_input(input) {
                Some(req) => Some(req),
                None => return RunOutcome::Refused,
            },
            ScanPayload::Network => None,
        };

        let generation = {
            let mut state = self.state.write().await;
            state
                .session_mut(self.kind)
                .begin(self.kind, request.as_ref())
        };
        info!(
            session = %self.kind,
            generation,
            target = request.as_ref().map(|r| r.target.as_str()).unwrap_or("<local subnet>"),
            "scan started"
        );

        let started = Instant::now();
        let reply = match &request {
            Some(req) => self.service.scan_host(req).await,
            None => self.service.scan_network().await,
        };
        let elapsed = started.elapsed();

        let outcome = match reply {
            Ok(reply) => {
                let decoded = match &request {
                    Some(_) => decode_host_reply(&reply, elapsed).map(ScanOutcome::Ports),
                    None => decode_network_reply(&reply).map(|hosts| ScanOutcome::Hosts { hosts }),
                };
                decoded.unwrap_or_else(|error| ScanOutcome::Failure { error })
            }
            Err(e) => {
                warn!(session = %self.kind, generation, error = %format!("{e:#}"), "scanner unreachable");
                ScanOutcome::Failure {
                    error: ScanError::Transport,
                }
            }
        };

        let result = {
            let mut state = self.state.write().await;
            state
                .session_mut(self.kind)
                .finish(self.kind, generation, outcome)
        };
        match result {
            RunOutcome::Superseded => {
                debug!(session = %self.kind, generation, "discarding stale reply")
            }
            _ => info!(
                session = %self.kind,
                generation,
                elapsed_ms = elapsed.as_millis() as u64,
                "scan finished"
            ),
        }
        result
    }
}

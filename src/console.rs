use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::ScanService;
use crate::render::HostAction;
use crate::session::{RunOutcome, ScanPayload, SessionController, SessionState};
use crate::types::{SessionKind, UiState};

/// Named views; exactly one is visible.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Scanner,
    Network,
}

impl View {
    pub const ALL: [View; 2] = [View::Scanner, View::Network];

    pub fn label(self) -> &'static str {
        match self {
            View::Scanner => "Port Scanner",
            View::Network => "Network Map",
        }
    }
}

/// Buttons the operator can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    HostScan,
    NetworkScan,
}

impl Control {
    fn session(self) -> SessionKind {
        match self {
            Control::HostScan => SessionKind::Host,
            Control::NetworkScan => SessionKind::Subnet,
        }
    }
}

/// Keys delivered to the target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// Replace the target field contents.
    Input(String),
    Key(Key),
    Click(Control),
    SelectView(View),
    Follow(HostAction),
}

/// Everything the console displays.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleState {
    pub target_input: String,
    pub view: View,
    pub host: SessionState,
    pub subnet: SessionState,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            target_input: String::new(),
            view: View::default(),
            host: SessionState::new(SessionKind::Host),
            subnet: SessionState::new(SessionKind::Subnet),
        }
    }
}

impl ConsoleState {
    pub fn session(&self, kind: SessionKind) -> &SessionState {
        match kind {
            SessionKind::Host => &self.host,
            SessionKind::Subnet => &self.subnet,
        }
    }

    pub(crate) fn session_mut(&mut self, kind: SessionKind) -> &mut SessionState {
        match kind {
            SessionKind::Host => &mut self.host,
            SessionKind::Subnet => &mut self.subnet,
        }
    }

    /// Sessions with a request in flight.
    pub fn active_sessions(&self) -> Vec<SessionKind> {
        SessionKind::ALL
            .into_iter()
            .filter(|k| self.session(*k).phase == UiState::Scanning)
            .collect()
    }

    pub fn is_scanning(&self) -> bool {
        !self.active_sessions().is_empty()
    }
}

/// Binds user events to the host and subnet sessions.
pub struct Console<S> {
    state: Arc<RwLock<ConsoleState>>,
    host: SessionController<S>,
    subnet: SessionController<S>,
}

impl<S: ScanService> Console<S> {
    pub fn new(service: S) -> Self {
        Self::with_service(Arc::new(service))
    }

    pub fn with_service(service: Arc<S>) -> Self {
        let state = Arc::new(RwLock::new(ConsoleState::default()));
        Self {
            host: SessionController::new(SessionKind::Host, state.clone(), service.clone()),
            subnet: SessionController::new(SessionKind::Subnet, state.clone(), service),
            state,
        }
    }

    /// Shared handle to the live state, for renderers that poll it.
    pub fn state(&self) -> Arc<RwLock<ConsoleState>> {
        self.state.clone()
    }

    pub async fn snapshot(&self) -> ConsoleState {
        self.state.read().await.clone()
    }

    /// Handle one event. Returns the scan result when the event started a scan.
    pub async fn handle(&self, event: ConsoleEvent) -> Option<RunOutcome> {
        match event {
            ConsoleEvent::Input(text) => {
                self.set_target_input(text).await;
                None
            }
            ConsoleEvent::Key(Key::Enter) => Some(self.submit_host_scan().await),
            ConsoleEvent::Key(Key::Char(c)) => {
                self.state.write().await.target_input.push(c);
                None
            }
            ConsoleEvent::Key(Key::Backspace) => {
                self.state.write().await.target_input.pop();
                None
            }
            ConsoleEvent::Click(control) => self.click(control).await,
            ConsoleEvent::SelectView(view) => {
                self.select_view(view).await;
                None
            }
            ConsoleEvent::Follow(action) => {
                self.follow(&action).await;
                None
            }
        }
    }

    pub async fn set_target_input(&self, text: impl Into<String>) {
        self.state.write().await.target_input = text.into();
    }

    pub async fn select_view(&self, view: View) {
        self.state.write().await.view = view;
    }

    /// Submit whatever is in the target field.
    pub async fn submit_host_scan(&self) -> RunOutcome {
        let input = self.state.read().await.target_input.clone();
        self.host.run(ScanPayload::Host(input)).await
    }

    pub async fn submit_network_scan(&self) -> RunOutcome {
        self.subnet.run(ScanPayload::Network).await
    }

    /// Hand a discovered host to the port scanner and bring its view forward.
    pub async fn follow(&self, action: &HostAction) {
        let mut state = self.state.write().await;
        state.target_input = action.target.clone();
        state.view = View::Scanner;
    }

    async fn click(&self, control: Control) -> Option<RunOutcome> {
        let enabled = self
            .state
            .read()
            .await
            .session(control.session())
            .control
            .enabled;
        if !enabled {
            debug!(?control, "ignoring click on disabled control");
            return None;
        }
        Some(match control {
            Control::HostScan => self.submit_host_scan().await,
            Control::NetworkScan => self.submit_network_scan().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ServiceReply;
    use crate::render::{render_session, Row};
    use anyhow::Result;
    use crate::types::ScanRequest;

    /// Echoes the requested target with one open port; lists two hosts for subnet scans.
    struct EchoService;

    impl ScanService for EchoService {
        async fn scan_host(&self, request: &ScanRequest) -> Result<ServiceReply> {
            let body = serde_json::json!({
                "target": request.target,
                "ip": "10.1.1.1",
                "results": [{"port": 22, "service": "SSH", "status": "Open", "banner": "SSH-2.0"}],
            });
            Ok(ServiceReply::new(200, body.to_string()))
        }

        async fn scan_network(&self) -> Result<ServiceReply> {
            Ok(ServiceReply::new(
                200,
                r#"{"hosts":[{"ip":"192.168.0.1","type":"Gateway"},{"ip":"192.168.0.9","type":"You"}]}"#,
            ))
        }
    }

    #[tokio::test]
    async fn enter_submits_typed_target() {
        let console = Console::new(EchoService);
        for c in "host1x".chars() {
            console.handle(ConsoleEvent::Key(Key::Char(c))).await;
        }
        console.handle(ConsoleEvent::Key(Key::Backspace)).await;
        let out = console.handle(ConsoleEvent::Key(Key::Enter)).await;
        assert_eq!(out, Some(RunOutcome::Applied(UiState::ShowingResults)));
        let s = console.snapshot().await;
        assert_eq!(s.host.header.as_deref(), Some("Target: host1 (10.1.1.1)"));
    }

    #[tokio::test]
    async fn enter_on_blank_field_changes_nothing() {
        let console = Console::new(EchoService);
        console.set_target_input("   ").await;
        let before = console.snapshot().await;
        assert_eq!(console.handle(ConsoleEvent::Key(Key::Enter)).await, Some(RunOutcome::Refused));
        assert_eq!(console.snapshot().await, before);
    }

    #[tokio::test]
    async fn select_view_is_idempotent() {
        let console = Console::new(EchoService);
        console.select_view(View::Network).await;
        let once = console.snapshot().await;
        console.select_view(View::Network).await;
        assert_eq!(console.snapshot().await, once);
        assert_eq!(once.view, View::Network);
    }

    #[tokio::test]
    async fn follow_fills_target_and_switches_view_without_scanning() {
        let console = Console::new(EchoService);
        console.select_view(View::Network).await;
        console.handle(ConsoleEvent::Click(Control::NetworkScan)).await;

        let s = console.snapshot().await;
        let table = render_session(SessionKind::Subnet, &s.subnet);
        let action = table
            .rows
            .iter()
            .find_map(|r| match r {
                Row::Host(h) if h.is_self => Some(h.action.clone()),
                _ => None,
            })
            .unwrap();

        console.handle(ConsoleEvent::Follow(action)).await;
        let s = console.snapshot().await;
        assert_eq!(s.target_input, "192.168.0.9");
        assert_eq!(s.view, View::Scanner);
        assert_eq!(s.host.phase, UiState::Idle);
    }

    #[tokio::test]
    async fn disabled_control_ignores_clicks() {
        let console = Console::new(EchoService);
        console.state().write().await.subnet.control.enabled = false;
        assert_eq!(console.handle(ConsoleEvent::Click(Control::NetworkScan)).await, None);
        assert_eq!(console.snapshot().await.subnet.phase, UiState::Idle);
    }

    #[tokio::test]
    async fn sessions_run_independently() {
        let console = Console::new(EchoService);
        console.set_target_input("box").await;
        let (host, subnet) = tokio::join!(console.submit_host_scan(), console.submit_network_scan());
        assert_eq!(host, RunOutcome::Applied(UiState::ShowingResults));
        assert_eq!(subnet, RunOutcome::Applied(UiState::ShowingResults));
        let s = console.snapshot().await;
        assert!(s.active_sessions().is_empty());
        assert_eq!(s.host.stats.map(|st| st.open_count), Some(1));
        assert_eq!(s.subnet.stats, None);
    }
}

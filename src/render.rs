//! Pure mapping from canonical records to display tables.

use serde::Serialize;

use crate::error::ScanError;
use crate::session::SessionState;
use crate::types::{HostRecord, PortRecord, ScanOutcome, SessionKind, UiState};

pub const PORT_COLUMNS: &[&str] = &["PORT", "SERVICE", "STATUS", "BANNER"];
pub const HOST_COLUMNS: &[&str] = &["IP ADDRESS", "STATUS", "TYPE", "ACTION"];

pub const NO_OPEN_PORTS: &str = "No open ports found";
pub const NO_ACTIVE_DEVICES: &str = "No active devices found";
pub const BANNER_PLACEHOLDER: &str = "-";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub columns: &'static [&'static str],
    pub rows: Vec<Row>,
}

impl TableModel {
    fn empty(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    fn notice(columns: &'static [&'static str], text: impl Into<String>, tone: Tone) -> Self {
        Self {
            columns,
            rows: vec![Row::Notice {
                text: text.into(),
                tone,
            }],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum Row {
    /// Full-width centered message spanning every column.
    Notice { text: String, tone: Tone },
    Port(PortRow),
    Host(HostRow),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Muted,
    Danger,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PortRow {
    pub port: u16,
    pub service: String,
    pub badge: Badge,
    pub banner: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostRow {
    pub ip: String,
    pub badge: Badge,
    pub label: String,
    pub is_self: bool,
    pub action: HostAction,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub variant: BadgeVariant,
    pub text: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    Open,
    Closed,
    Active,
}

/// "Scan Ports" on a discovered host: hands the address to the host session.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostAction {
    pub target: String,
}

impl HostAction {
    pub const LABEL: &'static str = "Scan Ports";
}

pub fn render_port_table(records: &[PortRecord]) -> TableModel {
    if records.is_empty() {
        return TableModel::notice(PORT_COLUMNS, NO_OPEN_PORTS, Tone::Muted);
    }
    let rows = records
        .iter()
        .map(|r| {
            // Badge styling is case-insensitive on the raw label.
            let variant = if r.status_label.eq_ignore_ascii_case("open") {
                BadgeVariant::Open
            } else {
                BadgeVariant::Closed
            };
            Row::Port(PortRow {
                port: r.port,
                service: r.service.clone(),
                badge: Badge {
                    variant,
                    text: r.status_label.to_uppercase(),
                },
                banner: r
                    .banner
                    .as_deref()
                    .filter(|b| !b.is_empty())
                    .unwrap_or(BANNER_PLACEHOLDER)
                    .to_string(),
            })
        })
        .collect();
    TableModel {
        columns: PORT_COLUMNS,
        rows,
    }
}

pub fn render_host_table(hosts: &[HostRecord]) -> TableModel {
    if hosts.is_empty() {
        return TableModel::notice(HOST_COLUMNS, NO_ACTIVE_DEVICES, Tone::Muted);
    }
    let rows = hosts
        .iter()
        .map(|h| {
            Row::Host(HostRow {
                ip: h.ip.clone(),
                badge: Badge {
                    variant: BadgeVariant::Active,
                    text: "ACTIVE".to_string(),
                },
                label: h.kind.clone(),
                is_self: h.is_self,
                action: HostAction {
                    target: h.ip.clone(),
                },
            })
        })
        .collect();
    TableModel {
        columns: HOST_COLUMNS,
        rows,
    }
}

pub fn render_error(kind: SessionKind, error: &ScanError) -> TableModel {
    TableModel::notice(
        columns_for(kind),
        format!("Error: {}", error.message()),
        Tone::Danger,
    )
}

/// Table for a session's current state. Idle and in-flight sessions show no rows.
pub fn render_session(kind: SessionKind, session: &SessionState) -> TableModel {
    match (session.phase, &session.outcome) {
        (UiState::ShowingResults, Some(ScanOutcome::Ports(report))) => {
            render_port_table(&report.records)
        }
        (UiState::ShowingResults, Some(ScanOutcome::Hosts { hosts })) => render_host_table(hosts),
        (UiState::ShowingError, Some(ScanOutcome::Failure { error })) => render_error(kind, error),
        _ => TableModel::empty(columns_for(kind)),
    }
}

fn columns_for(kind: SessionKind) -> &'static [&'static str] {
    match kind {
        SessionKind::Host => PORT_COLUMNS,
        SessionKind::Subnet => HOST_COLUMNS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortStatus;

    fn port(port: u16, status: &str, banner: Option<&str>) -> PortRecord {
        PortRecord {
            port,
            service: "svc".into(),
            status: if status.eq_ignore_ascii_case("open") {
                PortStatus::Open
            } else {
                PortStatus::Closed
            },
            status_label: status.into(),
            banner: banner.map(String::from),
        }
    }

    fn host(ip: &str, kind: &str) -> HostRecord {
        HostRecord {
            ip: ip.into(),
            kind: kind.into(),
            is_self: kind.contains("You"),
        }
    }

    #[test]
    fn empty_ports_show_placeholder() {
        let table = render_port_table(&[]);
        assert_eq!(
            table.rows,
            vec![Row::Notice {
                text: NO_OPEN_PORTS.into(),
                tone: Tone::Muted
            }]
        );
    }

    #[test]
    fn port_rows_use_badge_and_banner_placeholder() {
        let table = render_port_table(&[port(80, "Open", None), port(22, "open", Some("SSH-2.0-OpenSSH"))]);
        let Row::Port(first) = &table.rows[0] else {
            panic!("expected port row");
        };
        assert_eq!(first.banner, BANNER_PLACEHOLDER);
        assert_eq!(first.badge.variant, BadgeVariant::Open);
        assert_eq!(first.badge.text, "OPEN");
        let Row::Port(second) = &table.rows[1] else {
            panic!("expected port row");
        };
        assert_eq!(second.badge.variant, BadgeVariant::Open);
        assert_eq!(second.banner, "SSH-2.0-OpenSSH");
    }

    #[test]
    fn non_open_status_is_closed_badge() {
        let table = render_port_table(&[port(445, "Closed", None), port(21, "Error", None)]);
        for row in &table.rows {
            let Row::Port(r) = row else { panic!("expected port row") };
            assert_eq!(r.badge.variant, BadgeVariant::Closed);
        }
    }

    #[test]
    fn empty_hosts_show_placeholder() {
        let table = render_host_table(&[]);
        assert_eq!(table.columns, HOST_COLUMNS);
        assert!(matches!(&table.rows[0], Row::Notice { text, .. } if text == NO_ACTIVE_DEVICES));
    }

    #[test]
    fn host_rows_carry_action_and_self_flag() {
        let table = render_host_table(&[
            host("192.168.1.1", "Gateway"),
            host("192.168.1.7", "This Device (You)"),
        ]);
        let rows: Vec<&HostRow> = table
            .rows
            .iter()
            .map(|r| match r {
                Row::Host(h) => h,
                _ => panic!("expected host row"),
            })
            .collect();
        assert!(!rows[0].is_self);
        assert!(rows[1].is_self);
        assert_eq!(rows[1].action.target, "192.168.1.7");
        assert!(rows.iter().all(|r| r.badge.variant == BadgeVariant::Active));
    }

    #[test]
    fn rendering_is_idempotent() {
        let records = vec![port(80, "Open", None), port(443, "Closed", None)];
        let a = render_port_table(&records);
        let b = render_port_table(&records);
        assert_eq!(a, b);
        assert_eq!(b.rows.len(), 2);
    }

    #[test]
    fn error_row_spans_table() {
        let table = render_error(SessionKind::Host, &ScanError::Application("timeout".into()));
        assert_eq!(
            table.rows,
            vec![Row::Notice {
                text: "Error: timeout".into(),
                tone: Tone::Danger
            }]
        );
    }
}

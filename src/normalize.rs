//! Turn scanning service replies into canonical records.
//!
//! Missing or empty record lists are a valid zero-result outcome. Only a
//! non-success status or an unreadable body becomes a [`ScanError`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::client::ServiceReply;
use crate::error::{ScanError, UNKNOWN_ERROR};
use crate::types::{
    ErrorBody, HostRecord, HostScanReport, HostScanResponse, NetworkScanResponse, PortRecord,
    PortStatus, RawPortEntry, ScanStats,
};

/// Substring of a host `type` label that marks the console's own machine.
pub const SELF_MARKER: &str = "You";

/// Status text counted by the open-port statistic. Compared case-sensitively.
pub const OPEN_LABEL: &str = "Open";

pub fn normalize_host_scan(raw: HostScanResponse, elapsed: Duration) -> HostScanReport {
    let records: Vec<PortRecord> = raw
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(port_record)
        .collect();
    let stats = scan_stats(&records, elapsed);
    HostScanReport {
        target: raw.target,
        ip: raw.ip,
        records,
        stats,
    }
}

pub fn normalize_subnet_scan(raw: NetworkScanResponse) -> Vec<HostRecord> {
    raw.hosts
        .unwrap_or_default()
        .into_iter()
        .map(|entry| HostRecord {
            is_self: entry.kind.contains(SELF_MARKER),
            ip: entry.ip,
            kind: entry.kind,
        })
        .collect()
}

pub fn scan_stats(records: &[PortRecord], elapsed: Duration) -> ScanStats {
    ScanStats {
        total_probed: records.len(),
        open_count: records
            .iter()
            .filter(|r| r.status_label == OPEN_LABEL)
            .count(),
        elapsed_ms: round_millis(elapsed),
    }
}

/// Decode a `POST /scan` reply.
pub fn decode_host_reply(
    reply: &ServiceReply,
    elapsed: Duration,
) -> Result<HostScanReport, ScanError> {
    let raw: HostScanResponse = decode_success(reply)?;
    Ok(normalize_host_scan(raw, elapsed))
}

/// Decode a `POST /scan_network` reply.
pub fn decode_network_reply(reply: &ServiceReply) -> Result<Vec<HostRecord>, ScanError> {
    let raw: NetworkScanResponse = decode_success(reply)?;
    Ok(normalize_subnet_scan(raw))
}

/// Extract the failure carried by a non-success reply.
pub fn failure_from_reply(reply: &ServiceReply) -> ScanError {
    match serde_json::from_str::<ErrorBody>(&reply.body) {
        Ok(body) => ScanError::Application(body.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string())),
        Err(e) => {
            warn!(status = reply.status, error = %e, "unreadable error reply");
            ScanError::Transport
        }
    }
}

fn decode_success<T: DeserializeOwned>(reply: &ServiceReply) -> Result<T, ScanError> {
    if !reply.is_success() {
        return Err(failure_from_reply(reply));
    }
    serde_json::from_str(&reply.body).map_err(|e| {
        warn!(status = reply.status, error = %e, "malformed scan reply");
        ScanError::Transport
    })
}

fn port_record(entry: RawPortEntry) -> Option<PortRecord> {
    let port = match u16::try_from(entry.port) {
        Ok(p) if p != 0 => p,
        _ => {
            warn!(port = entry.port, "dropping entry with out-of-range port");
            return None;
        }
    };
    let status = if entry.status.eq_ignore_ascii_case("open") {
        PortStatus::Open
    } else {
        PortStatus::Closed
    };
    Some(PortRecord {
        port,
        service: entry.service,
        status,
        status_label: entry.status,
        banner: entry.banner,
    })
}

fn round_millis(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_reply(json: &str) -> HostScanResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_results_are_zero_stats() {
        let report = normalize_host_scan(
            host_reply(r#"{"target":"box","ip":"10.0.0.2","results":[]}"#),
            Duration::from_millis(12),
        );
        assert!(report.records.is_empty());
        assert_eq!(
            report.stats,
            ScanStats {
                total_probed: 0,
                open_count: 0,
                elapsed_ms: 12
            }
        );
    }

    #[test]
    fn missing_results_are_zero_stats() {
        let report = normalize_host_scan(host_reply(r#"{"target":"box","ip":"10.0.0.2"}"#), Duration::ZERO);
        assert_eq!(report.stats.total_probed, 0);
    }

    #[test]
    fn counts_open_and_keeps_missing_banner_absent() {
        let report = normalize_host_scan(
            host_reply(
                r#"{"target":"web","ip":"10.0.0.3","results":[
                    {"port":80,"service":"http","status":"Open","banner":null},
                    {"port":443,"service":"https","status":"Closed"}
                ]}"#,
            ),
            Duration::from_millis(40),
        );
        assert_eq!(report.stats.total_probed, 2);
        assert_eq!(report.stats.open_count, 1);
        assert_eq!(report.records[0].banner, None);
        assert_eq!(report.records[0].status, PortStatus::Open);
        assert_eq!(report.records[1].status, PortStatus::Closed);
    }

    #[test]
    fn open_count_is_case_sensitive_but_status_is_not() {
        let report = normalize_host_scan(
            host_reply(
                r#"{"target":"t","ip":"1.1.1.1","results":[
                    {"port":22,"service":"SSH","status":"OPEN"},
                    {"port":25,"service":"SMTP","status":"Open"}
                ]}"#,
            ),
            Duration::ZERO,
        );
        assert_eq!(report.records[0].status, PortStatus::Open);
        assert_eq!(report.records[0].status_label, "OPEN");
        assert_eq!(report.stats.open_count, 1);
    }

    #[test]
    fn error_status_is_closed() {
        let report = normalize_host_scan(
            host_reply(r#"{"target":"t","ip":"1.1.1.1","results":[{"port":21,"service":"Unknown","status":"Error"}]}"#),
            Duration::ZERO,
        );
        assert_eq!(report.records[0].status, PortStatus::Closed);
    }

    #[test]
    fn out_of_range_ports_are_dropped() {
        let report = normalize_host_scan(
            host_reply(
                r#"{"target":"t","ip":"1.1.1.1","results":[
                    {"port":0,"service":"x","status":"Open"},
                    {"port":70000,"service":"y","status":"Open"},
                    {"port":65535,"service":"z","status":"Open"}
                ]}"#,
            ),
            Duration::ZERO,
        );
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].port, 65535);
    }

    #[test]
    fn elapsed_is_rounded_to_millis() {
        assert_eq!(round_millis(Duration::from_micros(1_499)), 1);
        assert_eq!(round_millis(Duration::from_micros(1_500)), 2);
    }

    #[test]
    fn self_marker_anywhere_in_list() {
        let raw: NetworkScanResponse = serde_json::from_str(
            r#"{"hosts":[
                {"ip":"192.168.1.1","type":"Gateway"},
                {"ip":"192.168.1.20","type":"This Device (You)"},
                {"ip":"192.168.1.30","type":"Unknown"}
            ]}"#,
        )
        .unwrap();
        let hosts = normalize_subnet_scan(raw);
        let flags: Vec<bool> = hosts.iter().map(|h| h.is_self).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn error_reply_message_is_verbatim() {
        let reply = ServiceReply::new(504, r#"{"error":"timeout"}"#);
        assert_eq!(
            decode_host_reply(&reply, Duration::ZERO),
            Err(ScanError::Application("timeout".into()))
        );
    }

    #[test]
    fn error_reply_without_field_is_unknown() {
        let reply = ServiceReply::new(400, "{}");
        assert_eq!(
            failure_from_reply(&reply),
            ScanError::Application(UNKNOWN_ERROR.into())
        );
    }

    #[test]
    fn unparseable_error_reply_is_transport() {
        let reply = ServiceReply::new(502, "<html>Bad Gateway</html>");
        assert_eq!(decode_network_reply(&reply), Err(ScanError::Transport));
    }

    #[test]
    fn malformed_success_body_is_transport() {
        let reply = ServiceReply::new(200, "not json");
        assert_eq!(
            decode_host_reply(&reply, Duration::ZERO),
            Err(ScanError::Transport)
        );
    }
}

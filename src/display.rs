//! Plain-text drawing of the console for a terminal.

use std::fmt::Write;

use crate::console::{ConsoleState, View};
use crate::render::{render_session, HostAction, Row, TableModel, Tone};
use crate::session::SessionState;
use crate::types::SessionKind;

const BANNER_MAX: usize = 60;

/// Draw the tab bar and the visible view.
pub fn draw(state: &ConsoleState) -> String {
    let mut out = String::new();
    let tabs: Vec<String> = View::ALL
        .iter()
        .map(|v| {
            if *v == state.view {
                format!("[{}]", v.label())
            } else {
                format!(" {} ", v.label())
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join(" "));
    if state.is_scanning() {
        let active: Vec<String> = state.active_sessions().iter().map(|k| k.to_string()).collect();
        let _ = writeln!(out, "* scanning: {}", active.join(", "));
    }
    out.push('\n');

    match state.view {
        View::Scanner => {
            let _ = writeln!(out, "target > {}", state.target_input);
            draw_session(&mut out, SessionKind::Host, &state.host);
        }
        View::Network => draw_session(&mut out, SessionKind::Subnet, &state.subnet),
    }
    out
}

fn draw_session(out: &mut String, kind: SessionKind, session: &SessionState) {
    let control = if session.control.enabled {
        format!("[ {} ]", session.control.label)
    } else {
        format!("( {} )", session.control.label)
    };
    let _ = writeln!(out, "{control}");
    if let Some(header) = &session.header {
        let _ = writeln!(out, "{header}");
    }
    if let Some(stats) = &session.stats {
        let _ = writeln!(
            out,
            "Total: {}  Open: {}  Time: {}ms",
            stats.total_probed, stats.open_count, stats.elapsed_ms
        );
    }
    out.push('\n');
    out.push_str(&draw_table(&render_session(kind, session)));
}

/// Column-aligned table. Host rows are numbered so their action can be picked.
pub fn draw_table(table: &TableModel) -> String {
    let mut host_number = 0usize;
    let cells: Vec<Option<Vec<String>>> = table
        .rows
        .iter()
        .map(|row| {
            if matches!(row, Row::Host(_)) {
                host_number += 1;
            }
            row_cells(row, host_number)
        })
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in cells.iter().flatten() {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let full: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

    let mut out = String::new();
    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{c:<w$}"))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));

    for (row, cells) in table.rows.iter().zip(&cells) {
        match (row, cells) {
            (Row::Notice { text, tone }, _) => {
                let text = match tone {
                    Tone::Muted => text.clone(),
                    Tone::Danger => format!("!! {text}"),
                };
                let _ = writeln!(out, "{:^full$}", text);
            }
            (_, Some(cells)) => {
                let line: Vec<String> = cells
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{c:<w$}"))
                    .collect();
                let _ = writeln!(out, "{}", line.join("  ").trim_end());
            }
            (_, None) => {}
        }
    }
    out
}

/// Host actions in row order, numbered from 1 as drawn.
pub fn host_actions(table: &TableModel) -> Vec<HostAction> {
    table
        .rows
        .iter()
        .filter_map(|r| match r {
            Row::Host(h) => Some(h.action.clone()),
            _ => None,
        })
        .collect()
}

fn row_cells(row: &Row, host_number: usize) -> Option<Vec<String>> {
    match row {
        Row::Notice { .. } => None,
        Row::Port(p) => {
            let banner: String = p.banner.chars().take(BANNER_MAX).collect();
            Some(vec![
                p.port.to_string(),
                p.service.clone(),
                p.badge.text.clone(),
                banner,
            ])
        }
        Row::Host(h) => {
            // Own machine is flagged with a trailing star.
            let ip = if h.is_self {
                format!("{} *", h.ip)
            } else {
                h.ip.clone()
            };
            Some(vec![
                ip,
                h.badge.text.clone(),
                h.label.clone(),
                format!("[{host_number}] {}", HostAction::LABEL),
            ])
        }
    }
}

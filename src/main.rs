use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ::time::{format_description::well_known, OffsetDateTime};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scan_console::client::HttpScanService;
use scan_console::config::{ConsoleConfig, DEFAULT_SERVER, DEFAULT_TIMEOUT_MS};
use scan_console::console::{Console, ConsoleEvent, Control, Key, View};
use scan_console::display::{draw, host_actions};
use scan_console::render::render_session;
use scan_console::session::RunOutcome;
use scan_console::types::{ScanOutcome, SessionKind, UiState};

/// scan-console — operator console for a remote port and subnet scanning service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scan-console",
    version,
    about = "Operator console for a remote port and subnet scanning service.",
    long_about = None
)]
struct Cli {
    /// Base URL of the scanning service.
    #[arg(long, env = "SCAN_CONSOLE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Whole-request timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Port-scan a single host and print the results.
    Host {
        /// Hostname or IP address.
        target: String,

        /// Write the outcome as pretty JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Discover active devices on the scanner's local subnet.
    Network {
        /// Write the outcome as pretty JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Line-oriented console; type a target and press Enter to scan it.
    Interactive,
}

#[derive(Serialize)]
struct ScanExport<'a> {
    session: SessionKind,
    completed_at: String,
    #[serde(flatten)]
    outcome: &'a ScanOutcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = ConsoleConfig::new(cli.server.clone(), Duration::from_millis(cli.timeout_ms));
    let service = HttpScanService::new(config).context("invalid scanner configuration")?;
    info!(server = %service.config().server, "scanner configured");
    let console = Arc::new(Console::new(service));

    match cli.command {
        Command::Host { target, output } => {
            console.set_target_input(target).await;
            let outcome = console.submit_host_scan().await;
            if outcome == RunOutcome::Refused {
                bail!("target must not be empty");
            }
            finish_one_shot(&console, SessionKind::Host, output.as_deref()).await
        }
        Command::Network { output } => {
            console.select_view(View::Network).await;
            console.submit_network_scan().await;
            finish_one_shot(&console, SessionKind::Subnet, output.as_deref()).await
        }
        Command::Interactive => run_interactive(console).await,
    }
}

async fn finish_one_shot(
    console: &Console<HttpScanService>,
    kind: SessionKind,
    output: Option<&Path>,
) -> Result<()> {
    let state = console.snapshot().await;
    print!("{}", draw(&state));

    let session = state.session(kind);
    if let (Some(path), Some(outcome)) = (output, session.outcome.as_ref()) {
        write_outcome_json(path, kind, outcome)?;
        println!("Wrote JSON results to {}", path.display());
    }
    if let Some(err) = session.error() {
        bail!("{kind} scan failed: {err}");
    }
    Ok(())
}

fn write_outcome_json(path: &Path, session: SessionKind, outcome: &ScanOutcome) -> Result<()> {
    let export = ScanExport {
        session,
        completed_at: now_rfc3339(),
        outcome,
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, &export)?;
    Ok(())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

const INTERACTIVE_HELP: &str = "\
commands:
  <target>          type into the target field and press Enter
  :scan             click the port scan button
  :net              click the network scan button
  :view scanner     show the port scanner
  :view network     show the network map
  :pick N           scan ports of host N from the network map
  :show             redraw
  :quit";

async fn run_interactive(console: Arc<Console<HttpScanService>>) -> Result<()> {
    println!("{INTERACTIVE_HELP}\n");
    print!("{}", draw(&console.snapshot().await));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let event = match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => continue,
            (":quit" | ":q", _) => break,
            (":help", _) => {
                println!("{INTERACTIVE_HELP}");
                continue;
            }
            (":show", _) => {
                print!("{}", draw(&console.snapshot().await));
                continue;
            }
            (":scan", _) => ConsoleEvent::Click(Control::HostScan),
            (":net", _) => ConsoleEvent::Click(Control::NetworkScan),
            (":view", "scanner") => ConsoleEvent::SelectView(View::Scanner),
            (":view", "network") => ConsoleEvent::SelectView(View::Network),
            (":pick", n) => {
                let state = console.snapshot().await;
                let actions = host_actions(&render_session(SessionKind::Subnet, &state.subnet));
                match n.trim().parse::<usize>().ok().and_then(|i| i.checked_sub(1)).and_then(|i| actions.get(i)) {
                    Some(action) => ConsoleEvent::Follow(action.clone()),
                    None => {
                        println!("no host #{n} in the network map");
                        continue;
                    }
                }
            }
            (cmd, _) if cmd.starts_with(':') => {
                println!("unknown command: {line} (try :help)");
                continue;
            }
            _ => {
                console.set_target_input(line).await;
                ConsoleEvent::Key(Key::Enter)
            }
        };

        let starts_scan = matches!(event, ConsoleEvent::Key(Key::Enter) | ConsoleEvent::Click(_));
        if !starts_scan {
            console.handle(event).await;
            print!("{}", draw(&console.snapshot().await));
            continue;
        }

        // Scans run in the background so the other session stays usable.
        let bg_console = console.clone();
        tokio::spawn(async move {
            match bg_console.handle(event).await {
                Some(RunOutcome::Applied(UiState::ShowingResults | UiState::ShowingError)) => {
                    print!("{}", draw(&bg_console.snapshot().await));
                }
                Some(RunOutcome::Refused) => println!("enter a target first"),
                _ => {}
            }
        });
        // Show the in-flight state right away.
        tokio::task::yield_now().await;
        print!("{}", draw(&console.snapshot().await));
    }
    Ok(())
}

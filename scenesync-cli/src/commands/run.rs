//! Run command - continuous synchronization around a moving position.
//!
//! Positions arrive on stdin as one `lat,lon` pair per line (decimal
//! degrees). The orchestrator is polled on a fixed interval so freshly
//! synced tiles get refreshed and worker stops are reported. The command
//! ends on Ctrl-C, or once stdin is closed and the queue has drained.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use scenesync::logging::LoggingOptions;
use scenesync::service::{SyncOrchestrator, WorkerNotice};

use super::print_summary;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Lower bound for the poll interval.
const MIN_POLL_MS: u64 = 10;

/// Arguments for the run command.
pub struct RunArgs {
    pub debug: bool,
    pub no_bootstrap: bool,
    pub poll_ms: u64,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(LoggingOptions {
        stdout: true,
        debug: args.debug,
    })?;
    runner.log_startup("run");

    let config = runner.sync_config();
    if !config.enabled {
        println!("Scenery synchronization is disabled. Enable it with:");
        println!("  scenesync config set sync.enabled true");
        return Ok(());
    }

    let mut orchestrator = runner.create_orchestrator(config, !args.no_bootstrap);
    orchestrator.init()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let poll = Duration::from_millis(args.poll_ms.max(MIN_POLL_MS));
    let shutdown = CancellationToken::new();
    let result = runtime.block_on(drive(&mut orchestrator, poll, shutdown));

    // stdin is read on a blocking thread that may never return
    runtime.shutdown_background();

    orchestrator.stop();
    print_summary(&orchestrator.status());
    result
}

async fn drive(
    orchestrator: &mut SyncOrchestrator,
    poll: Duration,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            line = lines.next_line(), if input_open => match line? {
                Some(line) => handle_line(orchestrator, &line),
                None => {
                    debug!("Position input closed");
                    input_open = false;
                }
            },

            _ = ticker.tick() => {
                let report = orchestrator.update();
                match report.notice {
                    Some(WorkerNotice::Stalled) => {
                        return Err(CliError::Stalled {
                            failures: orchestrator.status().fail_count,
                        });
                    }
                    Some(WorkerNotice::Stopped) => {
                        println!("Scenery synchronization has stopped.");
                        break;
                    }
                    None => {}
                }
                if report.refreshed_dirs > 0 {
                    println!(
                        "Refreshed {} tile(s) in {} new director{}",
                        report.refreshed_tiles,
                        report.refreshed_dirs,
                        if report.refreshed_dirs == 1 { "y" } else { "ies" }
                    );
                }
                if !input_open && orchestrator.is_idle() && !orchestrator.status().busy {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_line(orchestrator: &mut SyncOrchestrator, line: &str) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    match parse_position(line) {
        Some((lat, lon)) => {
            if orchestrator.schedule_location(lat, lon) {
                println!("Position {:.4}, {:.4}: areas scheduled", lat, lon);
            }
        }
        None => {
            warn!(input = line, "Ignoring malformed position");
            eprintln!("Ignoring malformed position '{}', expected 'lat,lon'", line);
        }
    }
}

/// Parse `lat,lon` (comma or whitespace separated) in decimal degrees.
fn parse_position(line: &str) -> Option<(f64, f64)> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());

    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_accepts_comma_and_space() {
        assert_eq!(parse_position("53.6,8.4"), Some((53.6, 8.4)));
        assert_eq!(parse_position("-33.9, 151.2"), Some((-33.9, 151.2)));
        assert_eq!(parse_position("47 -122.3"), Some((47.0, -122.3)));
    }

    #[test]
    fn test_parse_position_rejects_garbage() {
        assert_eq!(parse_position("53.6"), None);
        assert_eq!(parse_position("north,east"), None);
        assert_eq!(parse_position("1,2,3"), None);
        assert_eq!(parse_position("NaN,2"), None);
    }
}

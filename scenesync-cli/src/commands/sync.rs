//! Sync command - one-shot synchronization around a single position.

use std::thread;
use std::time::{Duration, Instant};

use scenesync::logging::LoggingOptions;
use scenesync::prefetch::AreaCoord;
use scenesync::service::{SyncOrchestrator, WorkerNotice};

use super::print_summary;
use crate::error::CliError;
use crate::runner::CliRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive idle polls required before the queue counts as drained.
///
/// The worker briefly looks idle between popping a request and starting
/// the transfer.
const SETTLE_POLLS: u32 = 3;

/// Arguments for the sync command.
pub struct SyncArgs {
    pub lat: f64,
    pub lon: f64,
    pub timeout: u64,
    pub bootstrap: bool,
    pub debug: bool,
}

/// Run the sync command.
pub fn run(args: SyncArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(LoggingOptions {
        stdout: args.debug,
        debug: args.debug,
    })?;
    runner.log_startup("sync");

    // An explicit sync request overrides the enabled flag
    let mut config = runner.sync_config();
    config.enabled = true;

    let area = AreaCoord::from_lat_lon(args.lat, args.lon);
    if !area.is_valid() {
        return Err(CliError::Config(format!(
            "Position {}, {} is outside the valid range",
            args.lat, args.lon
        )));
    }

    println!("scenesync v{}", scenesync::VERSION);
    println!("================");
    println!();
    println!("Position:  {}, {}", args.lat, args.lon);
    println!("Area:      {}", area.bucket_path());
    println!("Transport: {}", config.transport);
    if let Some(dir) = &runner.config().sync.scenery_dir {
        println!("Scenery:   {}", dir.display());
    }
    println!();

    let mut orchestrator = runner.create_orchestrator(config, args.bootstrap);
    orchestrator.init()?;
    orchestrator.schedule_location(args.lat, args.lon);

    let deadline = Instant::now() + Duration::from_secs(args.timeout);
    let result = wait_for_completion(&mut orchestrator, deadline, args.timeout);

    orchestrator.stop();
    print_summary(&orchestrator.status());
    result
}

fn wait_for_completion(
    orchestrator: &mut SyncOrchestrator,
    deadline: Instant,
    timeout: u64,
) -> Result<(), CliError> {
    let mut settled = 0;

    loop {
        let report = orchestrator.update();
        match report.notice {
            Some(WorkerNotice::Stalled) => {
                return Err(CliError::Stalled {
                    failures: orchestrator.status().fail_count,
                });
            }
            Some(WorkerNotice::Stopped) => return Ok(()),
            None => {}
        }

        if orchestrator.is_idle() && !orchestrator.status().busy {
            settled += 1;
            if settled >= SETTLE_POLLS {
                return Ok(());
            }
        } else {
            settled = 0;
        }

        if Instant::now() >= deadline {
            return Err(CliError::Timeout {
                seconds: timeout,
                pending: orchestrator.worker().pending(),
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

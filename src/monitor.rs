/*!
 * Periodic re-checking of a directory against its baseline
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::baseline::BaselineStore;
use crate::classifier::classify;
use crate::config::Config;
use crate::error::Result;
use crate::scanner::Scanner;
use crate::types::{Classification, Snapshot};

/// Granularity at which a sleeping monitor notices a stop request
const STOP_POLL: Duration = Duration::from_millis(100);

/// Requests a running monitor to stop after its current iteration
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Outcome of one monitor iteration
#[derive(Debug)]
pub struct Tick {
    /// Iteration number, starting at 1
    pub iteration: u64,
    /// When the scan of this iteration started
    pub at: DateTime<Local>,
    /// Classification, or the scan-level error of this iteration
    pub result: Result<Classification>,
}

/// Repeatedly scans a directory and classifies it against the baseline
pub struct Monitor {
    config: Config,
    stop: StopHandle,
}

impl Monitor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stop: StopHandle::default(),
        }
    }

    /// Handle that ends [`Monitor::run`] between iterations
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run until stopped, invoking `on_tick` after every iteration.
    ///
    /// Fails only if the baseline cannot be loaded before the first
    /// iteration. Scan failures are handed to `on_tick` and retried on the
    /// next iteration.
    pub fn run<F>(&self, mut on_tick: F) -> Result<u64>
    where
        F: FnMut(&Tick),
    {
        let baseline = BaselineStore::new(&self.config.baseline_file).load()?;
        let scanner = Scanner::hidden(self.config.clone());

        info!(
            root = %self.config.target_dir.display(),
            interval = ?self.config.interval,
            "monitoring started"
        );

        let mut iteration = 0;
        while !self.stop.is_stopped() {
            iteration += 1;
            let tick = self.check_once(&scanner, &baseline, iteration);
            if let Err(e) = &tick.result {
                warn!("Check {} failed, retrying next interval: {}", iteration, e);
            }
            on_tick(&tick);

            self.sleep_interval();
        }

        info!(iterations = iteration, "monitoring stopped");
        Ok(iteration)
    }

    fn check_once(&self, scanner: &Scanner, baseline: &Snapshot, iteration: u64) -> Tick {
        let at = Local::now();
        let result = scanner.scan().map(|outcome| {
            debug!(
                iteration,
                files = outcome.snapshot.len(),
                issues = outcome.issues.len(),
                "scan complete"
            );
            classify(baseline, &outcome.snapshot)
        });

        Tick {
            iteration,
            at,
            result,
        }
    }

    fn sleep_interval(&self) {
        let deadline = Instant::now() + self.config.interval;
        while !self.stop.is_stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(STOP_POLL.min(deadline - now));
        }
    }
}

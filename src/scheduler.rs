//! Fixed-interval scheduling of the mail check.
//!
//! The loop sleeps `tick` between checks and runs the job once it is due.
//! The next run is due one interval after the previous one finished, so
//! runs never overlap. A job returning an error is logged and the loop goes
//! on; a job that panics ends the loop with [`SorterError::Fatal`].

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::error::{Result, SorterError};
use crate::poll::CycleReport;

/// Decides when the next mail check is due.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    tick: Duration,
    next_run: Instant,
}

impl Scheduler {
    /// A scheduler whose first run is one `interval` from now, or right away
    /// with `run_at_startup`.
    pub fn new(interval: Duration, tick: Duration, run_at_startup: bool) -> Self {
        Self::starting_at(Instant::now(), interval, tick, run_at_startup)
    }

    pub fn starting_at(
        now: Instant,
        interval: Duration,
        tick: Duration,
        run_at_startup: bool,
    ) -> Self {
        let next_run = if run_at_startup { now } else { now + interval };
        Self {
            interval,
            tick,
            next_run,
        }
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `job` if it is due at `now`.
    ///
    /// Returns `Ok(true)` if the job ran (successfully or not), `Ok(false)`
    /// if it was not due, and `Err(Fatal)` if it panicked.
    pub fn run_pending_at<F>(&mut self, now: Instant, job: &mut F) -> Result<bool>
    where
        F: FnMut() -> Result<CycleReport>,
    {
        if now < self.next_run {
            return Ok(false);
        }

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(&mut *job))
            .map_err(|payload| SorterError::Fatal(panic_message(&*payload)))?;
        log_outcome(&outcome);

        self.next_run = now + started.elapsed() + self.interval;
        Ok(true)
    }

    pub fn run_pending<F>(&mut self, job: &mut F) -> Result<bool>
    where
        F: FnMut() -> Result<CycleReport>,
    {
        self.run_pending_at(Instant::now(), job)
    }

    /// Run `job` on schedule until it panics.
    ///
    /// Only returns with the fatal error that stopped the loop.
    pub fn run_forever<F>(&mut self, mut job: F) -> SorterError
    where
        F: FnMut() -> Result<CycleReport>,
    {
        debug!(interval = ?self.interval, tick = ?self.tick, "Scheduler started");
        loop {
            if let Err(fatal) = self.run_pending(&mut job) {
                return fatal;
            }
            std::thread::sleep(self.tick);
        }
    }
}

/// Record the result of a cycle in the diagnostic log.
pub fn log_outcome(outcome: &Result<CycleReport>) {
    match outcome {
        Ok(report) => debug!(
            messages = report.messages,
            attachments = report.attachments,
            "Cycle complete"
        ),
        Err(e) => error!(
            error = %e.chain(),
            transport = e.is_transport(),
            "Mail check failed"
        ),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("mail check panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("mail check panicked: {s}")
    } else {
        "mail check panicked".to_string()
    }
}

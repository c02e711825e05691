//! Single-threaded UI context.
//!
//! Screen handlers must only run on one cooperative thread. The router posts
//! deliveries as jobs to a [`UiContext`]; [`UiLoop`] is a channel-backed
//! implementation that runs those jobs one at a time on its owning thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tracing::debug;

const UI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ui");

/// Unit of work executed on the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler for work that must run on the UI thread.
pub trait UiContext: Send + Sync {
    /// Enqueues `job`; jobs run in post order.
    fn post(&self, job: UiJob);
}

/// Cloneable handle for posting jobs to a [`UiLoop`].
#[derive(Debug, Clone)]
pub struct UiHandle {
    jobs: Sender<UiJob>,
}

impl UiContext for UiHandle {
    fn post(&self, job: UiJob) {
        if self.jobs.send(job).is_err() {
            debug!(target: UI_TARGET, "UI loop has stopped; job discarded");
        }
    }
}

/// Executor owning the receiving end of the job queue.
#[derive(Debug)]
pub struct UiLoop {
    jobs: Receiver<UiJob>,
}

impl UiLoop {
    /// Creates a loop and the first handle posting to it.
    #[must_use]
    pub fn new() -> (Self, UiHandle) {
        let (sender, receiver) = mpsc::channel();
        (Self { jobs: receiver }, UiHandle { jobs: sender })
    }

    /// Runs jobs until every [`UiHandle`] has been dropped.
    pub fn run(self) {
        for job in self.jobs.iter() {
            job();
        }
        debug!(target: UI_TARGET, "UI loop finished");
    }

    /// Runs every job already queued without blocking. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one job and runs it.
    ///
    /// Returns `false` when no job arrived or every handle is gone.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.jobs.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }
}

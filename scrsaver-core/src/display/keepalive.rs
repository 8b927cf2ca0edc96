// SPDX-License-Identifier: LGPL-3.0-only
//! Recurring keep-alive tick on a dedicated thread.

use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::MIN_TIMEOUT;

/// Tick period for a display whose screensaver kicks in after `timeout_secs`.
///
/// Half the timeout, or half of `min_timeout` when the timeout is disabled (`0`).
pub fn keepalive_period(timeout_secs: i32, min_timeout: Duration) -> Duration {
    if timeout_secs > 0 {
        Duration::from_secs(timeout_secs as u64) / 2
    } else if min_timeout.is_zero() {
        MIN_TIMEOUT / 2
    } else {
        min_timeout / 2
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs a closure every period until cancelled.
#[derive(Default)]
pub struct KeepAlive {
    worker: Option<Worker>,
}

impl KeepAlive {
    /// A keep-alive with no tick scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether ticks are currently scheduled.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Call `tick` every `period`, replacing any running schedule.
    pub fn start<F>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.cancel();

        let (stop, stop_rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("scrsaver-keepalive".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(handle) => {
                debug!("Keep-alive scheduled every {:?}", period);
                self.worker = Some(Worker { stop, handle });
            },
            Err(err) => warn!("Failed to spawn keep-alive thread: {err}"),
        }
    }

    /// Stop scheduling ticks. No tick runs once this returns.
    ///
    /// Safe to call when never started, and more than once.
    pub fn cancel(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop.send(());
        if worker.handle.join().is_err() {
            warn!("Keep-alive thread panicked");
        }
        debug!("Keep-alive cancelled");
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.cancel();
    }
}

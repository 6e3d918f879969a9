//! Lifecycle phase of a collector and the readiness latch built on it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Where a collector is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Phase {
    /// Constructed, `collect` not called yet.
    Idle = 0,
    /// `collect` is creating the directory and writing `STARTED`.
    Starting = 1,
    /// The loop accepts updates.
    Running = 2,
    /// The loop exited and `FINISHED` was written.
    Finished = 3,
    /// Startup failed; the loop never ran.
    Failed = 4,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Phase::Idle,
            1 => Phase::Starting,
            2 => Phase::Running,
            3 => Phase::Finished,
            _ => Phase::Failed,
        }
    }
}

/// Phase plus a latch that wakes every thread waiting for readiness.
///
/// The phase is readable lock-free; transitions happen under the mutex so
/// that waiters cannot miss a notification.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    phase: AtomicU8,
    lock: Mutex<()>,
    changed: Condvar,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Idle as u8),
            lock: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Claims the single run of the collector.
    pub(crate) fn begin(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.phase
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Starting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| Error::AlreadyStarted)
    }

    pub(crate) fn transition(&self, to: Phase) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.phase.store(to as u8, Ordering::Release);
        self.changed.notify_all();
    }

    /// Blocks until the loop became ready, optionally up to `timeout`.
    ///
    /// A collector that already finished counts as having been ready.
    pub(crate) fn wait_ready(&self, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match self.phase() {
                Phase::Running | Phase::Finished => return Ok(()),
                Phase::Failed => return Err(Error::StartupFailed),
                Phase::Idle | Phase::Starting => {}
            }
            guard = match deadline {
                None => self
                    .changed
                    .wait(guard)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(Error::ReadyTimeout);
                    }
                    self.changed
                        .wait_timeout(guard, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

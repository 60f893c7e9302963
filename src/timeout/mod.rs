//! Work and wall-clock budgets shared by every stage of a solve.
//!
//! A [`TimeOut`] is threaded mutably through tabulation, the frontier search
//! and tree construction. Each unit of work calls [`TimeOut::quick_check`],
//! which counts the work done and consults the wall clock only once per
//! [`WORK_PER_CLOCK_CHECK`] units so the common path stays allocation and
//! syscall free. A `true` return obliges the caller to stop promptly and
//! raise the typed timeout for its stage.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Number of `quick_check` calls between wall-clock reads.
pub const WORK_PER_CLOCK_CHECK: u64 = 100;

/// Budget handle carrying an optional deadline and an optional work quota.
#[derive(Debug, Clone)]
pub struct TimeOut {
    start: Instant,
    work_done: u64,
    duration_limit: Option<Duration>,
    work_limit: Option<u64>,
}

impl TimeOut {
    /// Creates a budget from an optional wall-clock limit and an optional
    /// number of work units.
    pub fn new(duration_limit: Option<Duration>, work_limit: Option<u64>) -> Self {
        TimeOut {
            start: Instant::now(),
            work_done: 0,
            duration_limit,
            work_limit,
        }
    }

    /// A budget that never fires. Work is still counted for reporting.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Counts one unit of work and reports whether a budget is exhausted.
    ///
    /// The work quota is tested on every call; the wall clock only every
    /// [`WORK_PER_CLOCK_CHECK`] calls.
    pub fn quick_check(&mut self) -> bool {
        self.work_done += 1;
        if let Some(limit) = self.work_limit {
            if self.work_done > limit {
                return true;
            }
        }
        if let Some(limit) = self.duration_limit {
            if self.work_done % WORK_PER_CLOCK_CHECK == 0 && self.start.elapsed() >= limit {
                return true;
            }
        }
        false
    }

    /// Units of work counted so far.
    pub fn work_done(&self) -> u64 {
        self.work_done
    }

    /// Wall-clock time since the budget was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Work and wall-clock cost of one solve stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeTaken {
    /// Work units consumed by the stage.
    pub work: u64,
    /// Wall-clock seconds consumed by the stage.
    pub seconds: f64,
}

/// Measures the work and wall-clock cost of a stage from snapshots taken at
/// its start.
pub(crate) struct StageTimer {
    work_at_start: u64,
    started: Instant,
}

impl StageTimer {
    pub(crate) fn begin(timeout: &TimeOut) -> Self {
        StageTimer {
            work_at_start: timeout.work_done(),
            started: Instant::now(),
        }
    }

    pub(crate) fn finish(self, timeout: &TimeOut) -> TimeTaken {
        TimeTaken {
            work: timeout.work_done() - self.work_at_start,
            seconds: self.started.elapsed().as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_quota_fires_exactly_after_limit() {
        let mut timeout = TimeOut::new(None, Some(3));
        assert!(!timeout.quick_check());
        assert!(!timeout.quick_check());
        assert!(!timeout.quick_check());
        assert!(timeout.quick_check());
        assert_eq!(timeout.work_done(), 4);
    }

    #[test]
    fn zero_duration_fires_on_clock_check() {
        let mut timeout = TimeOut::new(Some(Duration::from_secs(0)), None);
        let mut fired = false;
        for _ in 0..WORK_PER_CLOCK_CHECK {
            if timeout.quick_check() {
                fired = true;
                break;
            }
        }
        assert!(fired);
    }

    #[test]
    fn unbounded_never_fires() {
        let mut timeout = TimeOut::unbounded();
        for _ in 0..1000 {
            assert!(!timeout.quick_check());
        }
    }
}

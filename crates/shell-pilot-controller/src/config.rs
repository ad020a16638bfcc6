//! Owned run configuration, constructed once at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Loop pacing. The defaults bound the oracle request rate; tests shrink
/// them so runs complete quickly.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Pause after a successful iteration.
    pub step_pause: Duration,
    /// Longer pause after an iteration that errored.
    pub error_backoff: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            step_pause: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// Everything the controller needs for one run.
///
/// Built by the caller and passed in by value; the engine keeps no
/// ambient global configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Wall-clock budget for the whole session.
    pub time_budget: Duration,
    /// Where the line-per-event history lands at session end.
    pub history_path: PathBuf,
    /// Where the free-text summary lands at session end.
    pub summary_path: PathBuf,
    /// Loop pacing.
    pub pacing: Pacing,
}

impl RunConfig {
    /// Config with default pacing.
    #[must_use]
    pub fn new(
        time_budget: Duration,
        history_path: impl Into<PathBuf>,
        summary_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            time_budget,
            history_path: history_path.into(),
            summary_path: summary_path.into(),
            pacing: Pacing::default(),
        }
    }
}

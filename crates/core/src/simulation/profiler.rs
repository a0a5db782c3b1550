//! Stage timing for orchestrated runs.
//!
//! Each engine runs inside a [`StageScope`]; the elapsed time is logged at `debug` level
//! when the scope is dropped.

use std::time::Instant;
use tracing::debug;

/// A timing scope for one pipeline stage, measured using RAII.
pub struct StageScope {
    start: Instant,
    name: &'static str,
}

impl StageScope {
    /// Starts timing a stage.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for StageScope {
    fn drop(&mut self) {
        debug!("{} stage took {:.2} ms", self.name, self.elapsed_ms());
    }
}

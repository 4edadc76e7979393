//! Pipeline diagnostics: per-stage wall-clock timing and non-fatal warnings
//! (spec §6 "progress/metric reporting" interface), grounded on the
//! teacher's `Timing` scope-timer pattern, reported through `log` rather
//! than returned to the caller as data.

use std::time::{Duration, Instant};

/// A non-fatal observation surfaced during pipeline execution (e.g. "N
/// triangles rejected by the size field were left unrefined").
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub stage: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Diagnostic { stage, message: message.into() }
    }
}

/// Accumulates per-stage timings across one pipeline run and logs each one
/// as it completes.
#[derive(Default)]
pub struct Timing {
    entries: Vec<(&'static str, Duration)>,
}

impl Timing {
    pub fn new() -> Self {
        Timing::default()
    }

    /// Times `f`, logs it at `info`, and records it for the final summary.
    pub fn scope<R>(&mut self, stage: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        log::info!("{stage}: {:.3}s", elapsed.as_secs_f64());
        self.entries.push((stage, elapsed));
        result
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, d)| *d).sum()
    }

    pub fn entries(&self) -> &[(&'static str, Duration)] {
        &self.entries
    }

    pub fn log_summary(&self) {
        for (stage, elapsed) in &self.entries {
            log::info!("  {stage}: {:.3}s", elapsed.as_secs_f64());
        }
        log::info!("total: {:.3}s", self.total().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_records_and_returns_value() {
        let mut timing = Timing::new();
        let value = timing.scope("test", || 1 + 1);
        assert_eq!(value, 2);
        assert_eq!(timing.entries().len(), 1);
        assert_eq!(timing.entries()[0].0, "test");
    }

    #[test]
    fn total_sums_all_entries() {
        let mut timing = Timing::new();
        timing.scope("a", || std::thread::sleep(Duration::from_millis(1)));
        timing.scope("b", || std::thread::sleep(Duration::from_millis(1)));
        assert!(timing.total() >= Duration::from_millis(2));
    }
}

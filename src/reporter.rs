//! Test-failure reporters.
//!
//! The pipeline never decides how a failing test unwinds. It formats a
//! message, hands it to a [`Reporter`] and returns
//! [`HttpTesterError::Failure`](crate::HttpTesterError::Failure). Whether the
//! test stops right there is up to the reporter.

use std::sync::{Arc, Mutex};

/// The capability a session needs from the surrounding test harness.
pub trait Reporter {
    /// Marks the current test as failed with a fully formatted message.
    fn fail(&self, message: &str);

    /// Records diagnostic text that is not a failure on its own.
    fn log(&self, message: &str);
}

/// Fails by panicking, the same way a failed `assert!` does inside
/// `#[test]`. This is the reporter a session uses unless told otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn fail(&self, message: &str) {
        panic!("{message}");
    }

    fn log(&self, message: &str) {
        tracing::info!(target: "httptester", "{}", message);
    }
}

/// Collects failures and log lines instead of unwinding.
///
/// Clones share the same storage, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    failures: Arc<Mutex<Vec<String>>>,
    logs: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn has_failed(&self) -> bool {
        !self.failures().is_empty()
    }
}

impl Reporter for RecordingReporter {
    fn fail(&self, message: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(message.to_string());
        }
    }

    fn log(&self, message: &str) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.push(message.to_string());
        }
    }
}

//! In-memory sinks.

use crate::notify::{FindingSink, LogSink};
use crate::types::Finding;
use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, keeping its contents even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps every finding it receives.
#[derive(Debug, Default)]
pub struct FindingCollector {
    findings: Mutex<Vec<Finding>>,
}

impl FindingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the findings received so far, in arrival order.
    pub fn findings(&self) -> Vec<Finding> {
        lock(&self.findings).clone()
    }

    /// Package names of the findings received so far.
    pub fn packages(&self) -> Vec<String> {
        self.findings().into_iter().map(|f| f.package).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.findings).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FindingSink for FindingCollector {
    fn add_finding(&self, finding: Finding) {
        lock(&self.findings).push(finding);
    }
}

/// Keeps every log line it receives.
#[derive(Debug, Default)]
pub struct LogCollector {
    lines: Mutex<Vec<String>>,
}

impl LogCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }
}

impl LogSink for LogCollector {
    fn line(&self, line: &str) {
        lock(&self.lines).push(line.to_string());
    }
}

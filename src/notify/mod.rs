//! Outbound sinks for findings and log lines.
//!
//! This module handles:
//! - Colored console output
//! - In-memory collection (JSON output, embedding, tests)
//! - Forwarding findings to several sinks at once

pub mod console;
pub mod memory;

pub use console::ConsoleOutput;
pub use memory::{FindingCollector, LogCollector};

use crate::types::Finding;
use std::sync::Arc;

/// Receives every finding exactly once.
pub trait FindingSink: Send + Sync {
    fn add_finding(&self, finding: Finding);
}

/// Line-oriented text stream for human-readable events.
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Forwards each finding to every inner sink, in order.
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn FindingSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn FindingSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl FindingSink for FanOut {
    fn add_finding(&self, finding: Finding) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.add_finding(finding.clone());
            }
            last.add_finding(finding);
        }
    }
}

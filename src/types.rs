//! Core types and errors for the private module finder.

use crate::http::{ObservedTransaction, TargetId};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Public npm registry queried for package existence.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Fixed issue name attached to every finding.
pub const FINDING_NAME: &str = "Private module found";

/// Errors that can occur while observing traffic.
#[derive(Error, Debug)]
pub enum PrivmodError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed HTTP message: {0}")]
    MalformedMessage(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Rendered verbatim as the diagnostic line for a failed registry lookup.
    #[error("Failed to make request to '{url}': {reason}")]
    RegistryUnavailable { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PrivmodError>;

/// Outcome of a registry membership check.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum RegistryVerdict {
    /// The registry answered 200 for the package.
    Public,
    /// Any other answer; the package is treated as private.
    NotPublic,
}

impl RegistryVerdict {
    pub fn is_public(self) -> bool {
        self == RegistryVerdict::Public
    }
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

/// How much a finding should be trusted.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A package name referenced by a response but unknown to the public registry.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Issue name, always [`FINDING_NAME`].
    pub name: &'static str,
    /// Full URL of the request that produced the evidence.
    pub url: Url,
    /// Resource identity the finding was deduplicated under.
    pub target: TargetId,
    /// The module name found under `node_modules/`.
    pub package: String,
    pub severity: Severity,
    pub confidence: Confidence,
    /// Human-readable description.
    pub detail: String,
    /// The request/response pair the name was extracted from.
    pub evidence: Arc<ObservedTransaction>,
}

impl Finding {
    /// Build a finding with the fixed classification.
    pub fn new(
        url: Url,
        target: TargetId,
        package: &str,
        evidence: Arc<ObservedTransaction>,
    ) -> Self {
        let detail = format!(
            "The response references the node module '{}' which does not exist on the public npm registry. \
             It may be a private package exposed to dependency confusion.",
            package
        );

        Self {
            name: FINDING_NAME,
            url,
            target,
            package: package.to_string(),
            severity: Severity::High,
            confidence: Confidence::Medium,
            detail,
            evidence,
        }
    }

    /// The one-line log entry written for this finding.
    pub fn log_line(&self) -> String {
        format!("{} | {}: {}", self.url, FINDING_NAME, self.package)
    }
}

/// Counters kept by the scanner across all observed transactions.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ScanStats {
    /// Transactions handed to the scanner.
    pub observed: usize,
    /// Targets that went through full analysis.
    pub analysed: usize,
    /// Transactions skipped because their target was already claimed.
    pub duplicates: usize,
    /// Transactions whose request could not be parsed.
    pub unparseable: usize,
    /// Registry lookups performed.
    pub lookups: usize,
    /// Registry lookups that failed outright.
    pub lookup_failures: usize,
    /// Findings emitted.
    pub findings: usize,
}

/// Outcome of replaying one or more capture files.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub captures: Vec<String>,
    pub stats: ScanStats,
    pub duration_secs: f64,
    /// Problems that did not stop the replay.
    pub errors: Vec<String>,
}

/// Settings for the registry client.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL; package names are appended after a `/`.
    pub registry_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout_secs: 30,
            user_agent: format!("privmod/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

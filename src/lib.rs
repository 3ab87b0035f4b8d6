//! privmod - private node module finder.
//!
//! Inspects observed HTTP responses for `node_modules/<name>/` paths and reports every
//! referenced name that the public npm registry does not know about, a hint that an
//! internal package name is leaking (and may be open to dependency confusion).
//!
//! - [`parser`] pulls candidate names out of response bodies
//! - [`registry`] checks names against the public registry
//! - [`scanner`] deduplicates targets and ties everything together
//!
//! # Example
//!
//! ```no_run
//! use privmod::http::{HttpService, ObservedTransaction};
//! use privmod::notify::{FindingCollector, LogCollector};
//! use privmod::{RegistryConfig, Scanner};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let findings = Arc::new(FindingCollector::new());
//!     let log = Arc::new(LogCollector::new());
//!     let scanner = Scanner::with_npm(&RegistryConfig::default(), findings.clone(), log).unwrap();
//!
//!     let transaction = ObservedTransaction::new(
//!         HttpService::new("example.com", 443, true),
//!         b"GET /app.js HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec(),
//!         b"HTTP/1.1 200 OK\r\n\r\n//# node_modules/acme-internal/index.js".to_vec(),
//!     );
//!     scanner.on_observed(Arc::new(transaction)).await;
//!     println!("Found {} private modules", findings.len());
//! }
//! ```

pub mod capture;
pub mod config;
pub mod http;
pub mod notify;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod targets;
pub mod types;

pub use config::{CheckConfig, Commands, Config, ExtractConfig, ReplayConfig};
pub use parser::extract_module_names;
pub use registry::{NpmRegistry, RegistryChecker};
pub use scanner::Scanner;
pub use types::{
    Confidence, Finding, PrivmodError, RegistryConfig, RegistryVerdict, ReplaySummary, Result,
    ScanStats, Severity,
};

//! Public registry membership checks.
//!
//! A package counts as public only when the registry answers `200` for it. Every
//! lookup is an independent round trip; verdicts are never cached.

pub mod npm;

pub use npm::NpmRegistry;

use crate::types::{RegistryVerdict, Result};
use async_trait::async_trait;

/// Answers whether a package name exists on a public registry.
#[async_trait]
pub trait RegistryChecker: Send + Sync {
    /// Look up `name`.
    ///
    /// A non-200 answer is `Ok(NotPublic)`. Transport failures, timeouts and
    /// unreadable responses are `Err(PrivmodError::RegistryUnavailable)`, which callers
    /// must treat as not public.
    async fn lookup(&self, name: &str) -> Result<RegistryVerdict>;
}

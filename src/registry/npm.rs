//! npm registry checker.

use crate::registry::RegistryChecker;
use crate::types::{PrivmodError, RegistryConfig, RegistryVerdict, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

/// Checker backed by an npm-compatible registry.
pub struct NpmRegistry {
    client: Client,
    registry_url: String,
}

impl NpmRegistry {
    /// Create a checker with its own HTTP client.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .http1_only()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        if config.registry_url.trim().is_empty() {
            return Err(PrivmodError::ConfigError(
                "registry URL must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client,
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
        })
    }

    /// Lookup URL for a package. The name is appended as-is.
    pub fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.registry_url, name)
    }
}

#[async_trait]
impl RegistryChecker for NpmRegistry {
    async fn lookup(&self, name: &str) -> Result<RegistryVerdict> {
        let url = self.package_url(name);
        trace!("Checking npm: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PrivmodError::RegistryUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            debug!("Package exists: {}", name);
            Ok(RegistryVerdict::Public)
        } else {
            debug!("Package NOT FOUND: {} (HTTP {})", name, status);
            Ok(RegistryVerdict::NotPublic)
        }
    }
}

//! Shared AWS client configuration
//!
//! This crate centralizes credential resolution, proxy settings and region
//! selection for every service gateway in the workspace. Gateways take an
//! immutable [`GatewayConfig`] at construction time instead of each carrying
//! its own auth-type branching.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Credential resolution strategies
pub mod auth;
/// Proxy settings read from the process environment
pub mod proxy;

use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};

pub use auth::AuthStrategy;
pub use proxy::ProxyConfig;

/// Immutable configuration consumed by every gateway factory.
///
/// Construct with struct-update syntax over [`GatewayConfig::default`];
/// there is no partially-constructed builder state to reason about.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// How credentials are resolved
    pub auth: AuthStrategy,
    /// Target region; falls back to the SDK's default resolution chain
    pub region: Option<String>,
    /// Endpoint override, used to point gateways at LocalStack
    pub endpoint_url: Option<String>,
    /// Outbound proxy settings, if any
    pub proxy: Option<ProxyConfig>,
}

impl GatewayConfig {
    /// Reads proxy settings from the process environment and otherwise keeps
    /// defaults. Call sites that need a region or explicit credentials
    /// override the returned value field by field.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            proxy: ProxyConfig::from_env(),
            ..Self::default()
        }
    }

    /// Resolves this configuration into an SDK config usable by any service
    /// client.
    ///
    /// Retry and timeout defaults are fixed here (3 attempts, 30s per
    /// operation); anything beyond that is the SDK's concern.
    pub async fn sdk_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader = self.auth.apply(loader);

        loader.load().await
    }
}

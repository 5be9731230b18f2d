//! Credential resolution strategies
//!
//! One tagged variant per supported auth mode, consumed uniformly by every
//! gateway factory via [`GatewayConfig`](crate::GatewayConfig). This replaces
//! per-client auth branching.

use std::path::PathBuf;

use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::ConfigLoader;
use aws_credential_types::Credentials;

/// How a gateway authenticates against the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthStrategy {
    /// The SDK's default provider chain (env vars, shared config, IMDS, ...)
    #[default]
    Default,
    /// Instance-role credentials fetched from the instance metadata service
    InstanceRole,
    /// A named profile from the shared credentials file
    Profile {
        /// Profile name; `None` selects the `default` profile
        name: Option<String>,
        /// Override for the credentials file location
        config_file: Option<PathBuf>,
    },
    /// Explicit key pair, for callers that manage credentials themselves
    ExplicitKeys {
        /// Access key id
        access_key_id: String,
        /// Secret access key
        secret_access_key: String,
    },
}

impl AuthStrategy {
    /// Applies this strategy to an SDK config loader.
    #[must_use]
    pub fn apply(&self, loader: ConfigLoader) -> ConfigLoader {
        match self {
            Self::Default => loader,
            Self::InstanceRole => {
                loader.credentials_provider(ImdsCredentialsProvider::builder().build())
            }
            Self::Profile { name, config_file } => {
                let mut loader = loader;
                if let Some(name) = name {
                    loader = loader.profile_name(name);
                }
                if let Some(path) = config_file {
                    let files = ProfileFiles::builder()
                        .with_file(ProfileFileKind::Credentials, path)
                        .build();
                    loader = loader.profile_files(files);
                }
                loader
            }
            Self::ExplicitKeys {
                access_key_id,
                secret_access_key,
            } => loader.credentials_provider(Credentials::from_keys(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_default_chain() {
        assert_eq!(AuthStrategy::default(), AuthStrategy::Default);
    }

    #[tokio::test]
    async fn explicit_keys_resolve_without_environment() {
        let config = crate::GatewayConfig {
            auth: AuthStrategy::ExplicitKeys {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
            },
            region: Some("us-east-1".to_string()),
            ..crate::GatewayConfig::default()
        };

        let sdk_config = config.sdk_config().await;
        assert_eq!(sdk_config.region().map(AsRef::as_ref), Some("us-east-1"));
        assert!(sdk_config.credentials_provider().is_some());
    }
}

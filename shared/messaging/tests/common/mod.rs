//! Gateway test setup utilities

#![allow(dead_code)]

use client_config::{AuthStrategy, GatewayConfig};
use messaging::{QueueGateway, TopicGateway};
use uuid::Uuid;

/// Installs a subscriber once so `RUST_LOG` selects gateway trace output
/// while the integration tests run.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// LocalStack endpoint with hardcoded credentials for CI.
pub fn localstack_config() -> GatewayConfig {
    init_tracing();
    GatewayConfig {
        auth: AuthStrategy::ExplicitKeys {
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
        },
        region: Some("us-east-1".to_string()),
        endpoint_url: Some("http://localhost:4566".to_string()),
        proxy: None,
    }
}

/// Unique resource name so parallel tests never collide.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

pub async fn queue_gateway() -> QueueGateway {
    QueueGateway::connect(&localstack_config()).await
}

pub async fn topic_gateway() -> TopicGateway {
    TopicGateway::connect(&localstack_config()).await
}

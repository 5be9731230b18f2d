//! Integration tests for the queue gateway against LocalStack

mod common;

use std::collections::HashMap;

use common::{queue_gateway, unique_name};
use messaging::queue::DrainOptions;
use pretty_assertions::assert_eq;

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn send_receive_ack_round_trip() {
    let gateway = queue_gateway().await;
    let queue_url = gateway
        .create_queue(&unique_name("queue-round-trip"))
        .await
        .expect("queue creation should succeed");

    let body = r#"{"MessageName":"VideoEntitlements","AccountNumber":"80092320357266"}"#;
    let message_id = gateway
        .send(&queue_url, body)
        .await
        .expect("send should succeed");
    assert!(!message_id.is_empty(), "message id should not be empty");

    let received = gateway
        .receive_one(&queue_url)
        .await
        .expect("receive should succeed")
        .expect("a message should be visible");
    assert_eq!(received.body, body, "body must round-trip unmodified");

    gateway
        .delete_message(&queue_url, &received.receipt_handle)
        .await
        .expect("acknowledgment should succeed");

    assert!(
        !gateway
            .has_pending_messages(&queue_url)
            .await
            .expect("depth read should succeed"),
        "queue should be empty after acknowledgment"
    );

    gateway
        .delete_queue(&queue_url)
        .await
        .expect("queue deletion should succeed");
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn name_resolution_translates_not_found() {
    let gateway = queue_gateway().await;
    let queue_name = unique_name("queue-resolution");

    assert_eq!(
        gateway
            .resolve_queue_url(&queue_name)
            .await
            .expect("lookup of a missing queue should not error"),
        None
    );
    assert!(!gateway.queue_exists(&queue_name).await.expect("exists check"));

    let queue_url = gateway
        .create_queue(&queue_name)
        .await
        .expect("queue creation should succeed");

    assert!(gateway.queue_exists(&queue_name).await.expect("exists check"));
    assert_eq!(
        gateway
            .resolve_queue_url(&queue_name)
            .await
            .expect("lookup should succeed"),
        Some(queue_url.clone())
    );

    let queue_arn = gateway
        .resolve_queue_arn(&queue_url)
        .await
        .expect("attribute read should succeed")
        .expect("ARN attribute should be present");
    assert!(queue_arn.ends_with(&queue_name), "ARN should carry the queue name");

    gateway
        .delete_queue(&queue_url)
        .await
        .expect("queue deletion should succeed");
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn queue_delete_is_idempotent() {
    let gateway = queue_gateway().await;
    let queue_url = gateway
        .create_queue(&unique_name("queue-delete-twice"))
        .await
        .expect("queue creation should succeed");

    gateway
        .delete_queue(&queue_url)
        .await
        .expect("first delete should succeed");
    gateway
        .delete_queue(&queue_url)
        .await
        .expect("second delete of a gone queue should be a no-op");
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn batch_send_acks_every_entry_and_drain_collects_all() {
    let gateway = queue_gateway().await;
    let queue_url = gateway
        .create_queue(&unique_name("queue-batch"))
        .await
        .expect("queue creation should succeed");

    // 15 bodies forces chunking across two provider round trips.
    let bodies: Vec<String> = (0..15).map(|i| format!("payload-{i}")).collect();
    let acks = gateway
        .send_batch(&queue_url, &bodies)
        .await
        .expect("batch send should succeed");

    assert_eq!(acks.len(), bodies.len());
    let mut indices: Vec<usize> = acks.iter().map(|a| a.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..bodies.len()).collect::<Vec<_>>());

    let drained = gateway
        .drain(&queue_url, DrainOptions::default())
        .await
        .expect("drain should succeed");
    assert_eq!(drained.len(), bodies.len());

    // Delivery order is not guaranteed; compare as sets.
    let mut drained_bodies: Vec<String> = drained.iter().map(|m| m.body.clone()).collect();
    drained_bodies.sort();
    let mut expected = bodies.clone();
    expected.sort();
    assert_eq!(drained_bodies, expected);

    let handles: HashMap<String, String> = drained
        .iter()
        .map(|m| (m.message_id.clone(), m.receipt_handle.clone()))
        .collect();
    gateway
        .delete_messages(&queue_url, &handles)
        .await
        .expect("batched acknowledgment should succeed");

    assert_eq!(
        gateway
            .pending_message_count(&queue_url)
            .await
            .expect("depth read should succeed"),
        0
    );

    gateway
        .delete_queue(&queue_url)
        .await
        .expect("queue deletion should succeed");
}

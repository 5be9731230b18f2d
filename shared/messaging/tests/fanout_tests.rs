//! End-to-end fan-out tests against LocalStack

mod common;

use common::{localstack_config, unique_name};
use messaging::{FanoutOrchestrator, FanoutPlan, FanoutStage, TopicEnvelope, TopicError};
use pretty_assertions::assert_eq;

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn fanout_delivers_enveloped_bodies_and_cleans_up() {
    let orchestrator = FanoutOrchestrator::connect(&localstack_config()).await;
    let plan = FanoutPlan {
        topic_name: unique_name("fanout-topic"),
        queue_names: vec![unique_name("fanout-queue-a"), unique_name("fanout-queue-b")],
        raw_delivery: false,
    };
    let bodies = vec!["ping".to_string()];

    let report = orchestrator
        .run(&plan, &bodies)
        .await
        .expect("fan-out run should succeed");

    assert!(report.publish_failures.is_empty());
    assert_eq!(report.deliveries.len(), 2);
    for delivery in &report.deliveries {
        assert_eq!(delivery.messages.len(), 1, "each queue gets one copy");
        let envelope = TopicEnvelope::parse(&delivery.messages[0].body)
            .expect("default delivery wraps the body in the provider envelope");
        assert_eq!(envelope.message, "ping");
        assert_eq!(envelope.topic_arn, report.topic_arn);
    }
    assert!(
        report.cleanup_errors.is_empty(),
        "teardown should remove every resource: {:?}",
        report.cleanup_errors
    );

    // The run owns its resources; nothing should survive it.
    let queues = messaging::QueueGateway::connect(&localstack_config()).await;
    for name in &plan.queue_names {
        assert!(
            !queues.queue_exists(name).await.expect("exists check"),
            "queue {name} should be gone after the run"
        );
    }
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn raw_delivery_skips_the_envelope() {
    let orchestrator = FanoutOrchestrator::connect(&localstack_config()).await;
    let plan = FanoutPlan {
        topic_name: unique_name("fanout-raw-topic"),
        queue_names: vec![unique_name("fanout-raw-queue")],
        raw_delivery: true,
    };
    let bodies = vec!["ping".to_string()];

    let report = orchestrator
        .run(&plan, &bodies)
        .await
        .expect("fan-out run should succeed");

    assert_eq!(report.deliveries.len(), 1);
    let messages = &report.deliveries[0].messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, "ping", "raw delivery passes the body through");
    assert!(report.cleanup_errors.is_empty());
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn multiple_bodies_all_arrive() {
    let orchestrator = FanoutOrchestrator::connect(&localstack_config()).await;
    let plan = FanoutPlan {
        topic_name: unique_name("fanout-multi-topic"),
        queue_names: vec![unique_name("fanout-multi-queue")],
        raw_delivery: true,
    };
    let bodies: Vec<String> = (0..5).map(|i| format!("event-{i}")).collect();

    let report = orchestrator
        .run(&plan, &bodies)
        .await
        .expect("fan-out run should succeed");

    assert!(report.publish_failures.is_empty());
    let mut received: Vec<String> = report.deliveries[0]
        .messages
        .iter()
        .map(|m| m.body.clone())
        .collect();
    received.sort();
    let mut expected = bodies.clone();
    expected.sort();
    assert_eq!(received, expected);
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn mid_run_failure_tears_down_what_was_provisioned() {
    let orchestrator = FanoutOrchestrator::connect(&localstack_config()).await;
    let good_queue = unique_name("fanout-partial-queue");
    let plan = FanoutPlan {
        topic_name: unique_name("fanout-partial-topic"),
        // Spaces are not valid in queue names, so the second create fails
        // after the topic and the first queue already exist.
        queue_names: vec![good_queue.clone(), "not a valid queue name".to_string()],
        raw_delivery: false,
    };

    let err = orchestrator
        .run(&plan, &["ping".to_string()])
        .await
        .expect_err("the second queue name is rejected by the provider");

    assert_eq!(err.stage, FanoutStage::CreateQueue);
    assert!(
        err.cleanup_errors.is_empty(),
        "teardown of the provisioned resources should succeed: {:?}",
        err.cleanup_errors
    );

    // The first queue and the topic were created before the failure; the
    // unwind must have removed both.
    let queues = messaging::QueueGateway::connect(&localstack_config()).await;
    assert!(
        !queues.queue_exists(&good_queue).await.expect("exists check"),
        "queue {good_queue} should be gone after the failed run"
    );

    let topics = messaging::TopicGateway::connect(&localstack_config()).await;
    let topic_arn = format!("arn:aws:sns:us-east-1:000000000000:{}", plan.topic_name);
    assert!(
        matches!(
            topics.publish(&topic_arn, "ping").await,
            Err(TopicError::TopicNotFound(_))
        ),
        "topic {topic_arn} should be gone after the failed run"
    );
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn run_where_no_publish_is_accepted_fails_at_the_publish_stage() {
    let orchestrator = FanoutOrchestrator::connect(&localstack_config()).await;
    let queue_name = unique_name("fanout-nopub-queue");
    let plan = FanoutPlan {
        topic_name: unique_name("fanout-nopub-topic"),
        queue_names: vec![queue_name.clone()],
        raw_delivery: true,
    };

    // Empty bodies are rejected per publish; with every body rejected the
    // run has nothing to drain and must fail rather than report.
    let err = orchestrator
        .run(&plan, &[String::new(), String::new()])
        .await
        .expect_err("a run where nothing was published must fail");

    assert_eq!(err.stage, FanoutStage::Publish);
    assert!(
        err.cleanup_errors.is_empty(),
        "teardown should still succeed: {:?}",
        err.cleanup_errors
    );

    let queues = messaging::QueueGateway::connect(&localstack_config()).await;
    assert!(
        !queues.queue_exists(&queue_name).await.expect("exists check"),
        "queue {queue_name} should be gone after the failed run"
    );
}

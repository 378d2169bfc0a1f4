use std::sync::Arc;

use bytes::Bytes;
use rumqttc::QoS;

use super::test_support::{Call, Delivery, RecordingHandler, RecordingTransport};
use super::{MessageDispatcher, SubscriptionRegistry};
use crate::topic::TopicFilterError;

fn registry_with(transport: &Arc<RecordingTransport>) -> Arc<SubscriptionRegistry> {
	Arc::new(SubscriptionRegistry::new(transport.clone()))
}

#[tokio::test]
async fn test_subscribe_registers_entry_and_calls_transport() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);

	registry
		.subscribe("topic-0", QoS::AtMostOnce, RecordingHandler::new())
		.await
		.unwrap();

	assert_eq!(transport.calls(), vec![Call::Subscribe(
		"topic-0".to_string(),
		QoS::AtMostOnce
	)]);
	assert_eq!(registry.map_sizes().await, (1, 1));
	assert!(registry.contains("topic-0").await);
}

#[tokio::test]
async fn test_maps_stay_in_step_across_subscribe_and_unsubscribe() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);

	for i in 0 .. 5 {
		registry
			.subscribe(format!("topic-{i}"), QoS::AtLeastOnce, RecordingHandler::new())
			.await
			.unwrap();
	}
	assert_eq!(registry.map_sizes().await, (5, 5));

	registry.unsubscribe("topic-2").await;
	assert_eq!(registry.map_sizes().await, (4, 4));
	assert!(!registry.contains("topic-2").await);
	assert!(transport.calls().contains(&Call::Unsubscribe("topic-2".to_string())));
}

#[tokio::test]
async fn test_resubscribe_same_filter_replaces_handler_and_qos() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let dispatcher = MessageDispatcher::new(registry.clone());
	let first = RecordingHandler::new();
	let second = RecordingHandler::new();

	registry
		.subscribe("a/b", QoS::AtMostOnce, first.clone())
		.await
		.unwrap();
	registry
		.subscribe("a/b", QoS::ExactlyOnce, second.clone())
		.await
		.unwrap();

	assert_eq!(registry.len().await, 1);
	assert_eq!(registry.qos_of("a/b").await, Some(QoS::ExactlyOnce));

	dispatcher.message_arrived("a/b", &Bytes::from_static(b"x")).await;
	assert!(first.deliveries().is_empty());
	assert_eq!(second.deliveries().len(), 2);
}

#[tokio::test]
async fn test_unsubscribe_unknown_filter_is_silent() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);

	registry.unsubscribe("never/registered").await;

	assert!(transport.calls().is_empty());
	assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_invalid_filter_is_rejected_before_registration() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);

	let result = registry
		.subscribe("a/#/b", QoS::AtMostOnce, RecordingHandler::new())
		.await;

	assert_eq!(result, Err(TopicFilterError::hash_position("a/#/b")));
	assert!(transport.calls().is_empty());
	assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_failed_initial_subscribe_reports_and_keeps_entry() {
	let transport = RecordingTransport::new();
	transport.fail_on("topic-0");
	let registry = registry_with(&transport);
	let handler = RecordingHandler::new();

	registry
		.subscribe("topic-0", QoS::AtMostOnce, handler.clone())
		.await
		.unwrap();

	assert_eq!(handler.error_count(), 1);
	assert!(registry.contains("topic-0").await);
}

#[tokio::test]
async fn test_failed_unsubscribe_reports_to_removed_handler() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let handler = RecordingHandler::new();

	registry
		.subscribe("topic-0", QoS::AtMostOnce, handler.clone())
		.await
		.unwrap();
	transport.fail_on("topic-0");
	registry.unsubscribe("topic-0").await;

	assert_eq!(handler.error_count(), 1);
	assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_resubscribe_without_entries_issues_no_requests() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);

	let outcome = registry.resubscribe().await;

	assert_eq!(outcome.attempted, 0);
	assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_resubscribe_repeats_each_filter_with_its_qos() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);

	registry
		.subscribe("topic-0", QoS::AtMostOnce, RecordingHandler::new())
		.await
		.unwrap();
	registry
		.subscribe("topic-1", QoS::AtLeastOnce, RecordingHandler::new())
		.await
		.unwrap();
	let outcome = registry.resubscribe().await;

	assert_eq!(outcome.attempted, 2);
	assert_eq!(outcome.failed, 0);
	assert_eq!(transport.subscribe_calls("topic-0", QoS::AtMostOnce), 2);
	assert_eq!(transport.subscribe_calls("topic-1", QoS::AtLeastOnce), 2);
	assert_eq!(transport.calls().len(), 4);
}

#[tokio::test]
async fn test_resubscribe_failure_is_isolated_to_its_handler() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let failing = RecordingHandler::new();
	let healthy = RecordingHandler::new();

	registry
		.subscribe("topic-0", QoS::AtMostOnce, failing.clone())
		.await
		.unwrap();
	registry
		.subscribe("topic-1", QoS::AtLeastOnce, healthy.clone())
		.await
		.unwrap();
	transport.fail_on("topic-0");

	let outcome = registry.resubscribe().await;

	assert_eq!(outcome.failed, 1);
	assert_eq!(failing.error_count(), 1);
	assert_eq!(healthy.error_count(), 0);
	assert_eq!(transport.subscribe_calls("topic-1", QoS::AtLeastOnce), 2);
	assert!(registry.contains("topic-0").await);
}

#[tokio::test]
async fn test_dispatch_delivers_bytes_then_text_to_matching_handler_only() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let dispatcher = MessageDispatcher::new(registry.clone());
	let matching = RecordingHandler::new();
	let other = RecordingHandler::new();

	registry
		.subscribe("topic-0", QoS::AtMostOnce, matching.clone())
		.await
		.unwrap();
	registry
		.subscribe("topic-1", QoS::AtMostOnce, other.clone())
		.await
		.unwrap();

	let delivered = dispatcher
		.message_arrived("topic-0", &Bytes::from_static(b"foo"))
		.await;

	assert_eq!(delivered, 1);
	assert_eq!(matching.deliveries(), vec![
		Delivery::Bytes("topic-0".to_string(), Bytes::from_static(b"foo")),
		Delivery::Text("topic-0".to_string(), "foo".to_string()),
	]);
	assert!(other.deliveries().is_empty());
}

#[tokio::test]
async fn test_dispatch_to_every_matching_filter() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let dispatcher = MessageDispatcher::new(registry.clone());
	let exact = RecordingHandler::new();
	let plus = RecordingHandler::new();
	let hash = RecordingHandler::new();

	registry
		.subscribe("level/foo/topic", QoS::AtMostOnce, exact.clone())
		.await
		.unwrap();
	registry
		.subscribe("level/+/topic", QoS::AtMostOnce, plus.clone())
		.await
		.unwrap();
	registry
		.subscribe("#", QoS::AtMostOnce, hash.clone())
		.await
		.unwrap();

	let delivered = dispatcher
		.message_arrived("level/foo/topic", &Bytes::from_static(b"bar"))
		.await;

	assert_eq!(delivered, 3);
	for handler in [&exact, &plus, &hash] {
		assert_eq!(handler.deliveries().len(), 2);
	}
}

#[tokio::test]
async fn test_dispatch_without_match_is_dropped() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let dispatcher = MessageDispatcher::new(registry.clone());

	let delivered = dispatcher
		.message_arrived("nobody/listens", &Bytes::from_static(b"x"))
		.await;

	assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_dispatch_decodes_invalid_utf8_lossily() {
	let transport = RecordingTransport::new();
	let registry = registry_with(&transport);
	let dispatcher = MessageDispatcher::new(registry.clone());
	let handler = RecordingHandler::new();

	registry
		.subscribe("raw", QoS::AtMostOnce, handler.clone())
		.await
		.unwrap();
	dispatcher
		.message_arrived("raw", &Bytes::from_static(&[b'o', b'k', 0xff]))
		.await;

	assert_eq!(
		handler.deliveries()[1],
		Delivery::Text("raw".to_string(), "ok\u{fffd}".to_string())
	);
}

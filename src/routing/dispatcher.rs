//! Routing of inbound messages to registered handlers

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use super::registry::SubscriptionRegistry;

/// Delivers each inbound message to every handler whose filter matches.
#[derive(Clone)]
pub struct MessageDispatcher {
	registry: Arc<SubscriptionRegistry>,
}

impl MessageDispatcher {
	/// Creates a dispatcher reading from `registry`
	pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
		Self { registry }
	}

	/// Routes one message and returns how many handlers received it.
	///
	/// Each matching handler gets `done_bytes` followed by `done_text`.
	/// Messages nobody subscribed to are dropped.
	pub async fn message_arrived(&self, topic: &str, payload: &Bytes) -> usize {
		let handlers = self.registry.matching_handlers(topic).await;
		if handlers.is_empty() {
			debug!(topic = %topic, "No subscription matches topic, message dropped");
			return 0;
		}

		let text = String::from_utf8_lossy(payload);
		for (filter, handler) in &handlers {
			trace!(topic = %topic, filter = %filter, "Delivering message");
			handler.done_bytes(topic, payload);
			handler.done_text(topic, &text);
		}
		handlers.len()
	}
}

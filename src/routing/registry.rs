//! Subscription registry
//!
//! Maps every registered topic filter to its QoS and handler and keeps the
//! broker side in step through the [`Transport`]. The two maps live behind a
//! single lock so they always hold the same key set. Handler callbacks run
//! only after every lock has been released.
//!
//! Mutations and resubscribe walks are serialized by a separate ordering
//! lock held across the transport request, so the broker sees requests for a
//! filter in the same order the registry applied them. Dispatch never takes
//! the ordering lock.

use std::collections::HashMap;
use std::sync::Arc;

use arcstr::ArcStr;
use futures::future::join_all;
use rumqttc::QoS;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::handler::HandlerRef;
use super::transport::Transport;
use crate::topic::{FilterResult, matches, validation};

#[derive(Default)]
struct RegistryState {
	qos_by_filter: HashMap<ArcStr, QoS>,
	handler_by_filter: HashMap<ArcStr, HandlerRef>,
}

impl RegistryState {
	fn insert(&mut self, filter: ArcStr, qos: QoS, handler: HandlerRef) {
		self.qos_by_filter.insert(filter.clone(), qos);
		self.handler_by_filter.insert(filter, handler);
	}

	fn remove(&mut self, filter: &str) -> Option<HandlerRef> {
		self.qos_by_filter.remove(filter);
		self.handler_by_filter.remove(filter)
	}

	/// Snapshot of every entry as `(filter, qos, handler)`
	fn entries(&self) -> Vec<(ArcStr, QoS, HandlerRef)> {
		self.qos_by_filter
			.iter()
			.filter_map(|(filter, qos)| {
				let handler = self.handler_by_filter.get(filter)?;
				Some((filter.clone(), *qos, Arc::clone(handler)))
			})
			.collect()
	}
}

/// Result of one [`SubscriptionRegistry::resubscribe`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResubscribeOutcome {
	/// Subscribe requests issued
	pub attempted: usize,
	/// Requests the transport refused
	pub failed: usize,
}

/// Concurrency-safe mapping from topic filter to `(QoS, handler)`.
///
/// Owned by a single client. Entries survive transport failures so that the
/// next [`resubscribe`](Self::resubscribe) retries them.
pub struct SubscriptionRegistry {
	state: RwLock<RegistryState>,
	// Pairs each registry change with its transport request.
	ordering: Mutex<()>,
	transport: Arc<dyn Transport>,
}

impl SubscriptionRegistry {
	/// Creates an empty registry issuing requests through `transport`
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self {
			state: RwLock::new(RegistryState::default()),
			ordering: Mutex::new(()),
			transport,
		}
	}

	/// Registers `handler` for `filter` and asks the broker for it.
	///
	/// A repeated call with the same filter replaces the previous QoS and
	/// handler. A transport failure is reported to `handler` and the entry is
	/// kept. Only an invalid filter is returned as an error, in which case
	/// nothing is registered.
	pub async fn subscribe(
		&self,
		filter: impl Into<ArcStr>,
		qos: QoS,
		handler: HandlerRef,
	) -> FilterResult<()> {
		let filter = filter.into();
		validation::validate_filter(&filter)?;

		let ordering = self.ordering.lock().await;
		self.state
			.write()
			.await
			.insert(filter.clone(), qos, Arc::clone(&handler));
		debug!(filter = %filter, qos = ?qos, "Subscription registered");

		let result = self.transport.subscribe(&filter, qos).await;
		drop(ordering);

		if let Err(err) = result {
			error!(
				filter = %filter,
				error = %err,
				"Failed to subscribe to MQTT topic filter"
			);
			handler.error(&err);
		}
		Ok(())
	}

	/// Drops the entry for `filter` and asks the broker to forget it.
	///
	/// Unknown filters are ignored without contacting the transport.
	pub async fn unsubscribe(&self, filter: &str) {
		let ordering = self.ordering.lock().await;
		let removed = self.state.write().await.remove(filter);
		let Some(handler) = removed else {
			debug!(filter = %filter, "Unsubscribe for unknown filter ignored");
			return;
		};

		let result = self.transport.unsubscribe(filter).await;
		drop(ordering);

		if let Err(err) = result {
			error!(
				filter = %filter,
				error = %err,
				"Failed to unsubscribe from MQTT topic filter"
			);
			handler.error(&err);
		}
	}

	/// Re-issues a subscribe request for every registered filter.
	///
	/// Requests are independent: a failure is reported to that entry's
	/// handler and does not affect the others. Subscribe and unsubscribe
	/// calls issued meanwhile wait for the walk to finish.
	pub async fn resubscribe(&self) -> ResubscribeOutcome {
		let ordering = self.ordering.lock().await;
		let entries = self.state.read().await.entries();
		if entries.is_empty() {
			debug!("No subscriptions to restore");
			return ResubscribeOutcome::default();
		}

		let attempted = entries.len();
		let results = join_all(entries.into_iter().map(
			|(filter, qos, handler)| async move {
				let result = self.transport.subscribe(&filter, qos).await;
				(filter, handler, result)
			},
		))
		.await;
		drop(ordering);

		let mut failed = 0;
		for (filter, handler, result) in results {
			if let Err(err) = result {
				warn!(
					filter = %filter,
					error = %err,
					"Failed to resubscribe to MQTT topic filter"
				);
				handler.error(&err);
				failed += 1;
			}
		}
		info!(attempted, failed, "Resubscribed to registered topic filters");
		ResubscribeOutcome { attempted, failed }
	}

	/// Handlers of every filter matching the concrete `topic`
	pub async fn matching_handlers(
		&self,
		topic: &str,
	) -> Vec<(ArcStr, HandlerRef)> {
		self.state
			.read()
			.await
			.handler_by_filter
			.iter()
			.filter(|(filter, _)| matches(filter, topic))
			.map(|(filter, handler)| (filter.clone(), Arc::clone(handler)))
			.collect()
	}

	/// Number of registered filters
	pub async fn len(&self) -> usize {
		self.state.read().await.qos_by_filter.len()
	}

	/// `true` when no filter is registered
	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	/// `true` when `filter` is registered exactly as given
	pub async fn contains(&self, filter: &str) -> bool {
		self.state.read().await.qos_by_filter.contains_key(filter)
	}

	/// QoS requested for `filter`, if registered
	pub async fn qos_of(&self, filter: &str) -> Option<QoS> {
		self.state.read().await.qos_by_filter.get(filter).copied()
	}

	/// Registered filters in no particular order
	pub async fn filters(&self) -> Vec<ArcStr> {
		self.state.read().await.qos_by_filter.keys().cloned().collect()
	}

	#[cfg(test)]
	pub(crate) async fn map_sizes(&self) -> (usize, usize) {
		let state = self.state.read().await;
		(state.qos_by_filter.len(), state.handler_by_filter.len())
	}
}

//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mqtt_session_client::advanced::Transport;
use mqtt_session_client::{MessageHandler, QoS, TransportError};

/// Transport that records every request and refuses configured filters
#[derive(Default)]
pub struct MockTransport {
	subscribes: Mutex<Vec<(String, QoS)>>,
	unsubscribes: Mutex<Vec<String>>,
	publishes: Mutex<Vec<(String, Bytes, QoS, bool)>>,
	refused: Mutex<HashSet<String>>,
	requests: Mutex<Vec<String>>,
	latency: Mutex<Option<Duration>>,
}

impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn refuse(&self, filter: &str) {
		self.refused.lock().unwrap().insert(filter.to_string());
	}

	pub fn accept(&self, filter: &str) {
		self.refused.lock().unwrap().remove(filter);
	}

	pub fn subscribe_count(&self, filter: &str, qos: QoS) -> usize {
		self.subscribes
			.lock()
			.unwrap()
			.iter()
			.filter(|(f, q)| f == filter && *q == qos)
			.count()
	}

	pub fn total_subscribes(&self) -> usize {
		self.subscribes.lock().unwrap().len()
	}

	pub fn unsubscribes(&self) -> Vec<String> {
		self.unsubscribes.lock().unwrap().clone()
	}

	pub fn publishes(&self) -> Vec<(String, Bytes, QoS, bool)> {
		self.publishes.lock().unwrap().clone()
	}

	/// Delays every subscribe and unsubscribe before it is recorded
	pub fn set_latency(&self, latency: Duration) {
		*self.latency.lock().unwrap() = Some(latency);
	}

	/// Subscribe and unsubscribe requests in arrival order, as `SUB f` or
	/// `UNSUB f`
	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}

	pub fn last_request_for(&self, filter: &str) -> Option<String> {
		self.requests()
			.into_iter()
			.rev()
			.find(|request| request.split_once(' ').map(|(_, f)| f) == Some(filter))
	}

	async fn arrive(&self, request: String) {
		let latency = *self.latency.lock().unwrap();
		if let Some(latency) = latency {
			tokio::time::sleep(latency).await;
		}
		self.requests.lock().unwrap().push(request);
	}

	fn check(&self, name: &str) -> Result<(), TransportError> {
		if self.refused.lock().unwrap().contains(name) {
			Err(TransportError::rejected(format!("{name} refused")))
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl Transport for MockTransport {
	async fn subscribe(&self, filter: &str, qos: QoS) -> Result<(), TransportError> {
		self.arrive(format!("SUB {filter}")).await;
		self.subscribes.lock().unwrap().push((filter.to_string(), qos));
		self.check(filter)
	}

	async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
		self.arrive(format!("UNSUB {filter}")).await;
		self.unsubscribes.lock().unwrap().push(filter.to_string());
		self.check(filter)
	}

	async fn publish(
		&self,
		topic: &str,
		payload: Bytes,
		qos: QoS,
		retain: bool,
	) -> Result<(), TransportError> {
		self.check(topic)?;
		self.publishes
			.lock()
			.unwrap()
			.push((topic.to_string(), payload, qos, retain));
		Ok(())
	}

	async fn disconnect(&self) -> Result<(), TransportError> {
		Ok(())
	}
}

/// Handler recording what it was told
#[derive(Default)]
pub struct CountingHandler {
	pub bytes: Mutex<Vec<(String, Vec<u8>)>>,
	pub texts: Mutex<Vec<(String, String)>>,
	pub errors: Mutex<Vec<String>>,
}

impl CountingHandler {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn byte_count(&self) -> usize {
		self.bytes.lock().unwrap().len()
	}

	pub fn text_count(&self) -> usize {
		self.texts.lock().unwrap().len()
	}

	pub fn error_count(&self) -> usize {
		self.errors.lock().unwrap().len()
	}
}

impl MessageHandler for CountingHandler {
	fn done_bytes(&self, topic: &str, payload: &Bytes) {
		self.bytes
			.lock()
			.unwrap()
			.push((topic.to_string(), payload.to_vec()));
	}

	fn done_text(&self, topic: &str, text: &str) {
		self.texts
			.lock()
			.unwrap()
			.push((topic.to_string(), text.to_string()));
	}

	fn error(&self, cause: &TransportError) {
		self.errors.lock().unwrap().push(cause.to_string());
	}
}

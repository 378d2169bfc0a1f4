//! Recording doubles for the transport and handler seams

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::QoS;

use super::error::TransportError;
use super::handler::MessageHandler;
use super::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Subscribe(String, QoS),
	Unsubscribe(String),
	Publish(String, Bytes, QoS, bool),
	Disconnect,
}

#[derive(Default)]
pub struct RecordingTransport {
	calls: Mutex<Vec<Call>>,
	failing_filters: Mutex<HashSet<String>>,
}

impl RecordingTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn fail_on(&self, filter: &str) {
		self.failing_filters.lock().unwrap().insert(filter.to_string());
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub fn subscribe_calls(&self, filter: &str, qos: QoS) -> usize {
		let expected = Call::Subscribe(filter.to_string(), qos);
		self.calls().iter().filter(|call| **call == expected).count()
	}

	fn record(&self, call: Call, filter: &str) -> Result<(), TransportError> {
		self.calls.lock().unwrap().push(call);
		if self.failing_filters.lock().unwrap().contains(filter) {
			return Err(TransportError::rejected(format!("refused {filter}")));
		}
		Ok(())
	}
}

#[async_trait]
impl Transport for RecordingTransport {
	async fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
	) -> Result<(), TransportError> {
		self.record(Call::Subscribe(filter.to_string(), qos), filter)
	}

	async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
		self.record(Call::Unsubscribe(filter.to_string()), filter)
	}

	async fn publish(
		&self,
		topic: &str,
		payload: Bytes,
		qos: QoS,
		retain: bool,
	) -> Result<(), TransportError> {
		self.record(Call::Publish(topic.to_string(), payload, qos, retain), topic)
	}

	async fn disconnect(&self) -> Result<(), TransportError> {
		self.record(Call::Disconnect, "")
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
	Bytes(String, Bytes),
	Text(String, String),
	Error(String),
}

#[derive(Default)]
pub struct RecordingHandler {
	deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingHandler {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn deliveries(&self) -> Vec<Delivery> {
		self.deliveries.lock().unwrap().clone()
	}

	pub fn error_count(&self) -> usize {
		self.deliveries()
			.iter()
			.filter(|delivery| matches!(delivery, Delivery::Error(_)))
			.count()
	}
}

impl MessageHandler for RecordingHandler {
	fn done_bytes(&self, topic: &str, payload: &Bytes) {
		self.deliveries
			.lock()
			.unwrap()
			.push(Delivery::Bytes(topic.to_string(), payload.clone()));
	}

	fn done_text(&self, topic: &str, text: &str) {
		self.deliveries
			.lock()
			.unwrap()
			.push(Delivery::Text(topic.to_string(), text.to_string()));
	}

	fn error(&self, cause: &TransportError) {
		self.deliveries
			.lock()
			.unwrap()
			.push(Delivery::Error(cause.to_string()));
	}
}

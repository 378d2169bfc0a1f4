//! Bridge from the rumqttc event loop to the subscription core

use std::time::Duration;

use rumqttc::{
	ConnAck, ConnectReturnCode, ConnectionError, Event, EventLoop, Outgoing,
	Packet,
};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use super::async_client::MqttClient;
use super::config::ClientSettings;
use crate::connection::ConnectionLost;

/// What the poll loop does after one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
	Continue,
	Backoff(Duration),
	Stop,
}

pub(crate) struct EventLoopDriver {
	event_loop: EventLoop,
	state: DriverState,
}

impl EventLoopDriver {
	pub(crate) fn new(
		event_loop: EventLoop,
		client: MqttClient,
		settings: ClientSettings,
		server_uri: String,
	) -> Self {
		Self {
			event_loop,
			state: DriverState::new(client, settings, server_uri),
		}
	}

	/// Polls until a Disconnect packet is seen in either direction or too
	/// many consecutive errors occur. rumqttc reconnects on the next poll
	/// after an error, so each successful CONNACK after the first counts as a
	/// reconnect.
	pub(crate) async fn run(self) {
		let Self {
			mut event_loop,
			mut state,
		} = self;
		state.start();

		loop {
			let event = event_loop.poll().await;
			match state.handle(event).await {
				| Flow::Continue => {}
				| Flow::Backoff(delay) => time::sleep(delay).await,
				| Flow::Stop => break,
			}
		}

		// Requests still queued by a resubscribe fail fast once the event
		// loop is gone instead of waiting for a poll that never comes.
		drop(event_loop);
		state.finish().await;
		info!("MQTT event loop terminated");
	}
}

/// Connection state tracked across polls
pub(crate) struct DriverState {
	client: MqttClient,
	settings: ClientSettings,
	server_uri: String,
	connected: bool,
	error_count: u32,
	completion: Option<JoinHandle<()>>,
}

impl DriverState {
	pub(crate) fn new(
		client: MqttClient,
		settings: ClientSettings,
		server_uri: String,
	) -> Self {
		Self {
			client,
			settings,
			server_uri,
			connected: true,
			error_count: 0,
			completion: None,
		}
	}

	/// Reports the session opened by the bootstrap CONNACK, which was
	/// consumed before the driver started.
	pub(crate) fn start(&mut self) {
		self.spawn_connect_complete(false);
	}

	pub(crate) async fn handle(
		&mut self,
		event: Result<Event, ConnectionError>,
	) -> Flow {
		match event {
			| Ok(Event::Incoming(Packet::ConnAck(ConnAck {
				session_present,
				code: ConnectReturnCode::Success,
			}))) => {
				self.error_count = 0;
				self.connected = true;
				info!(session_present, "MQTT reconnected, restoring subscriptions");
				self.spawn_connect_complete(true);
				Flow::Continue
			}
			| Ok(Event::Incoming(Packet::ConnAck(ConnAck { code, .. }))) => {
				warn!(code = ?code, "MQTT reconnect rejected by broker");
				Flow::Continue
			}
			| Ok(Event::Incoming(Packet::Publish(publish))) => {
				self.error_count = 0;
				debug!(
					topic = %publish.topic,
					payload_size = publish.payload.len(),
					"Received MQTT message"
				);
				self.client
					.message_arrived(&publish.topic, &publish.payload)
					.await;
				Flow::Continue
			}
			| Ok(Event::Incoming(Packet::Disconnect)) => {
				info!("Received MQTT Disconnect packet from server");
				self.connected = false;
				self.client.connection_lost(&ConnectionLost::ServerDisconnect);
				Flow::Stop
			}
			| Ok(Event::Outgoing(Outgoing::Disconnect)) => {
				info!("Sent MQTT Disconnect packet to server");
				Flow::Stop
			}
			| Ok(notification) => {
				self.error_count = 0;
				trace!(notification = ?notification, "MQTT notification");
				Flow::Continue
			}
			| Err(err) => self.poll_failed(&err),
		}
	}

	fn poll_failed(&mut self, err: &ConnectionError) -> Flow {
		self.error_count += 1;
		error!(error_count = self.error_count, error = %err, "MQTT event loop error");
		if self.connected {
			self.connected = false;
			self.client
				.connection_lost(&ConnectionLost::Network(err.to_string()));
		}

		if self.error_count >= self.settings.max_consecutive_errors {
			error!(
				error_count = self.error_count,
				max_errors = self.settings.max_consecutive_errors,
				"Too many consecutive errors, terminating event loop"
			);
			return Flow::Stop;
		}

		let delay = self.settings.retry_delay(self.error_count);
		warn!(delay = ?delay, error_count = self.error_count, "Retrying MQTT connection");
		Flow::Backoff(delay)
	}

	// Resubscribe requests are queued on this same event loop, so they must
	// not be awaited from inside it. Each task waits for the previous one so
	// hooks see connects in order.
	fn spawn_connect_complete(&mut self, is_reconnect: bool) {
		let client = self.client.clone();
		let server_uri = self.server_uri.clone();
		let previous = self.completion.take();
		self.completion = Some(tokio::spawn(async move {
			if let Some(previous) = previous {
				if let Err(err) = previous.await {
					warn!(error = %err, "Previous connect-complete task failed");
				}
			}
			client.connect_complete(is_reconnect, &server_uri).await;
		}));
	}

	/// Waits for the last connect-complete task, and through the chain for
	/// every earlier one.
	pub(crate) async fn finish(&mut self) {
		if let Some(completion) = self.completion.take() {
			if let Err(err) = completion.await {
				warn!(error = %err, "Connect-complete task failed");
			}
		}
	}
}

use std::sync::Arc;
use std::time::Duration;

use arcstr::ArcStr;
use bytes::Bytes;
use rumqttc::Packet;
use rumqttc::{AsyncClient, ConnAck, ConnectReturnCode, Event, EventLoop, QoS};
use tracing::{debug, info};

use super::config::{MqttClientConfig, Session};
use super::error::{ConnectionEstablishmentError, MqttClientError};
use super::event_loop::EventLoopDriver;
use crate::connection::{ConnectionLost, LifecycleController, MqttConnection};
use crate::routing::{
	HandlerRef, MessageDispatcher, ResubscribeOutcome, SubscriptionRegistry,
	Transport,
};
use crate::topic::{FilterResult, validation};

/// MQTT client that keeps its subscriptions alive across reconnects.
///
/// Cloning is cheap; clones share one registry. Transport events are fed in
/// through [`connect_complete`](Self::connect_complete),
/// [`connection_lost`](Self::connection_lost) and
/// [`message_arrived`](Self::message_arrived), either by the bundled rumqttc
/// event loop or by whoever owns the transport.
#[derive(Clone)]
pub struct MqttClient {
	transport: Arc<dyn Transport>,
	registry: Arc<SubscriptionRegistry>,
	dispatcher: MessageDispatcher,
	lifecycle: Arc<LifecycleController>,
}

impl MqttClient {
	/// Client over an arbitrary transport. No event loop is started.
	pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
		let registry = Arc::new(SubscriptionRegistry::new(Arc::clone(&transport)));
		Self {
			transport,
			dispatcher: MessageDispatcher::new(Arc::clone(&registry)),
			lifecycle: Arc::new(LifecycleController::new(Arc::clone(&registry))),
			registry,
		}
	}

	/// Connect to the broker at `url` with default settings.
	///
	/// Returns both client and connection handle. Keep the connection alive
	/// for the session duration, call `connection.shutdown()` when done.
	pub async fn connect(
		url: &str,
		session: Session,
	) -> Result<(Self, MqttConnection), MqttClientError> {
		let config = MqttClientConfig::from_url(url, session)?;
		Self::connect_with_config(config).await
	}

	/// Connect with custom configuration.
	///
	/// Hooks set through [`MqttClientConfig::with_hooks`] are installed
	/// before the event loop starts, so they observe the initial
	/// connect-complete.
	pub async fn connect_with_config(
		config: MqttClientConfig,
	) -> Result<(Self, MqttConnection), MqttClientError> {
		if config.settings.max_consecutive_errors == 0 {
			return Err(MqttClientError::ConfigurationValue(
				"max_consecutive_errors must be greater than 0".to_string(),
			));
		}
		let server_uri = config.server_uri().to_string();
		let hooks = config.hooks().clone();
		let (async_client, new_event_loop) = AsyncClient::new(
			config.connection,
			config.settings.event_loop_capacity,
		);

		let timeout_millis = config.settings.connection_timeout_millis;
		let connected_event_loop = tokio::time::timeout(
			Duration::from_millis(timeout_millis),
			Self::establish_connection(new_event_loop),
		)
		.await
		.map_err(|_| ConnectionEstablishmentError::Timeout { timeout_millis })?
		.map_err(MqttClientError::ConnectionEstablishment)?;
		info!(server_uri = %server_uri, "Connected to MQTT broker");

		let transport: Arc<dyn Transport> = Arc::new(async_client);
		let client = Self::with_transport(Arc::clone(&transport));
		// Before the driver reports the bootstrap connect-complete.
		client.lifecycle.install_hooks(hooks);
		let driver = EventLoopDriver::new(
			connected_event_loop,
			client.clone(),
			config.settings,
			server_uri,
		);
		let event_loop_handle = tokio::spawn(driver.run());

		Ok((client, MqttConnection::new(transport, event_loop_handle)))
	}

	async fn establish_connection(
		mut event_loop: EventLoop,
	) -> Result<EventLoop, ConnectionEstablishmentError> {
		loop {
			match event_loop.poll().await {
				| Ok(Event::Incoming(Packet::ConnAck(ConnAck { code, .. }))) => {
					if code == ConnectReturnCode::Success {
						debug!("MQTT connection established successfully");
						return Ok(event_loop);
					}
					debug!(code = ?code, "MQTT connection rejected by broker");
					return Err(ConnectionEstablishmentError::BrokerRejected { code });
				}
				| Ok(notification) => {
					debug!(notification = ?notification, "Bootstrap phase notification");
				}
				| Err(connection_err) => {
					debug!(error = %connection_err, "MQTT connection error during bootstrap phase");
					return Err(ConnectionEstablishmentError::Network(connection_err));
				}
			}
		}
	}

	/// Registers `handler` for `filter` at `qos`.
	///
	/// Supports MQTT wildcards: `+` (single level), `#` (multi-level, last
	/// segment only). Subscribing again to the same filter replaces its
	/// handler. Transport failures go to `handler.error`; the subscription
	/// stays registered and is retried on the next reconnect.
	pub async fn subscribe(
		&self,
		filter: impl Into<ArcStr>,
		qos: QoS,
		handler: HandlerRef,
	) -> FilterResult<()> {
		self.registry.subscribe(filter, qos, handler).await
	}

	/// Removes the subscription for `filter`, if any
	pub async fn unsubscribe(&self, filter: &str) {
		self.registry.unsubscribe(filter).await
	}

	/// Publishes `payload` on a concrete topic.
	///
	/// Topic must not contain wildcard characters (`+`, `#`).
	pub async fn publish(
		&self,
		topic: &str,
		payload: impl Into<Bytes>,
		qos: QoS,
		retain: bool,
	) -> Result<(), MqttClientError> {
		validation::validate_topic(topic)?;
		self.transport
			.publish(topic, payload.into(), qos, retain)
			.await?;
		Ok(())
	}

	/// Re-issues subscribe requests for every registered filter
	pub async fn resubscribe(&self) -> ResubscribeOutcome {
		self.registry.resubscribe().await
	}

	/// Sets the hook run after every (re)connect, replacing any previous one.
	///
	/// The initial connect-complete may already have run by the time this is
	/// called; use [`MqttClientConfig::with_hooks`] to observe it.
	pub fn on_connection_complete<F>(&self, hook: F)
	where F: Fn(bool, &str) + Send + Sync + 'static {
		self.lifecycle.set_on_connection_complete(hook);
	}

	/// Sets the hook run when the connection drops, replacing any previous one
	pub fn on_connection_lost<F>(&self, hook: F)
	where F: Fn(&ConnectionLost) + Send + Sync + 'static {
		self.lifecycle.set_on_connection_lost(hook);
	}

	/// Transport callback: a session was established
	pub async fn connect_complete(
		&self,
		is_reconnect: bool,
		server_uri: &str,
	) -> ResubscribeOutcome {
		self.lifecycle.connect_complete(is_reconnect, server_uri).await
	}

	/// Transport callback: the connection went down
	pub fn connection_lost(&self, cause: &ConnectionLost) {
		self.lifecycle.connection_lost(cause)
	}

	/// Transport callback: a message arrived on `topic`.
	///
	/// Returns the number of handlers that received it.
	pub async fn message_arrived(&self, topic: &str, payload: &Bytes) -> usize {
		self.dispatcher.message_arrived(topic, payload).await
	}

	/// The registry backing this client
	pub fn registry(&self) -> &SubscriptionRegistry {
		&self.registry
	}
}

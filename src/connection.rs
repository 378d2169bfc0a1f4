//! MQTT connection management module
//!
//! Holds the lifecycle controller reacting to connect and disconnect events
//! and the handle used to shut the connection down.

pub mod lifecycle;


use std::sync::Arc;

pub use lifecycle::{
	ConnectionHooks, ConnectionLost, LifecycleController, OnConnectionComplete,
	OnConnectionLost,
};
use tracing::{error, info, warn};

use crate::routing::Transport;

/// MQTT connection handle for lifecycle management
///
/// Keeps the event loop task alive for the duration of the session. Call
/// [`shutdown`](Self::shutdown) and await it before dropping.
pub struct MqttConnection {
	transport: Arc<dyn Transport>,
	event_loop_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MqttConnection {
	pub(crate) fn new(
		transport: Arc<dyn Transport>,
		event_loop_handle: tokio::task::JoinHandle<()>,
	) -> Self {
		Self {
			transport,
			event_loop_handle: Some(event_loop_handle),
		}
	}

	/// Gracefully shutdown the MQTT connection by:
	/// 1. Sending the MQTT Disconnect packet (ends the event loop)
	/// 2. Waiting for the event loop to finish processing
	///
	/// Registered subscriptions are left in place on the client.
	pub async fn shutdown(mut self) -> Result<(), crate::MqttClientError> {
		if let Err(e) = self.transport.disconnect().await {
			warn!(error = %e, "Failed to disconnect MQTT client");
		}

		if let Some(handle) = self.event_loop_handle.take() {
			if let Err(e) = handle.await {
				warn!(error = %e, "Event loop task failed");
			}
		} else {
			warn!("No event loop handle available to await");
		}

		info!("MQTT connection shut down");
		Ok(())
	}
}

impl Drop for MqttConnection {
	fn drop(&mut self) {
		if self.event_loop_handle.is_some() {
			error!(
				"MqttConnection dropped without calling shutdown(). Please \
				 call shutdown() and await its completion before dropping."
			);
		}
	}
}

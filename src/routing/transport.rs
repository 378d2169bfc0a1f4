//! Seam between the subscription core and the MQTT connection
//!
//! The core never touches sockets. Everything it needs from the broker
//! connection goes through [`Transport`], implemented here for
//! [`rumqttc::AsyncClient`].

use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{AsyncClient, QoS};

use super::error::TransportError;

/// Outbound half of the broker connection.
///
/// Implementations own framing, timeouts and retries; every call either
/// hands the request over or reports why it could not.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	/// Requests a subscription for `filter` at `qos`
	async fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
	) -> Result<(), TransportError>;

	/// Requests removal of the subscription for `filter`
	async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError>;

	/// Publishes `payload` on a concrete `topic`
	async fn publish(
		&self,
		topic: &str,
		payload: Bytes,
		qos: QoS,
		retain: bool,
	) -> Result<(), TransportError>;

	/// Ends the session with a DISCONNECT
	async fn disconnect(&self) -> Result<(), TransportError>;
}

#[async_trait]
impl Transport for AsyncClient {
	async fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
	) -> Result<(), TransportError> {
		AsyncClient::subscribe(self, filter, qos).await?;
		Ok(())
	}

	async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
		AsyncClient::unsubscribe(self, filter).await?;
		Ok(())
	}

	async fn publish(
		&self,
		topic: &str,
		payload: Bytes,
		qos: QoS,
		retain: bool,
	) -> Result<(), TransportError> {
		self.publish_bytes(topic, qos, retain, payload).await?;
		Ok(())
	}

	async fn disconnect(&self) -> Result<(), TransportError> {
		AsyncClient::disconnect(self).await?;
		Ok(())
	}
}

use thiserror::Error;

/// Errors reported by the transport collaborator.
///
/// Delivered to the `error` callback of the handler whose subscription
/// triggered the failing request.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Request could not be handed to the MQTT event loop
	#[error("Transport request failed: {0}")]
	Client(#[from] rumqttc::ClientError),

	/// Request was refused by the transport
	#[error("Transport rejected request: {0}")]
	Rejected(String),

	/// No session is currently established
	#[error("Transport is disconnected")]
	Disconnected,
}

impl TransportError {
	/// Creates a new Rejected error
	pub fn rejected(reason: impl Into<String>) -> Self {
		Self::Rejected(reason.into())
	}
}

use rumqttc::OptionError;

use crate::{routing::TransportError, topic::TopicFilterError};

/// Failures while waiting for the first CONNACK
#[derive(Debug, thiserror::Error)]
pub enum ConnectionEstablishmentError {
	/// Socket or protocol failure before the broker answered
	#[error("Network connection failed: {0}")]
	Network(#[from] rumqttc::ConnectionError),

	/// Broker answered with a non-success return code
	#[error("Broker rejected connection: {code:?}")]
	BrokerRejected {
		/// Return code sent by the broker
		code: rumqttc::ConnectReturnCode,
	},

	/// No CONNACK within `connection_timeout_millis`
	#[error("Connection establishment timed out after {timeout_millis}ms")]
	Timeout {
		/// Configured timeout
		timeout_millis: u64,
	},
}

/// Errors that can occur in MQTT client operations
#[derive(Debug, thiserror::Error)]
pub enum MqttClientError {
	/// Transport refused a request that has no handler to report to
	#[error("Transport error: {0}")]
	Transport(#[from] TransportError),

	/// Configuration errors when parsing MQTT options
	#[error("Configuration error: {0}")]
	Configuration(#[from] OptionError),

	/// Invalid configuration parameter values
	#[error("Invalid configuration value: {0}")]
	ConfigurationValue(String),

	/// QoS level outside 0..=2
	#[error("Invalid QoS level {0}, expected 0, 1 or 2")]
	InvalidQos(u8),

	/// Invalid topic filter or publish topic
	#[error("Topic error: {0}")]
	Topic(#[from] TopicFilterError),

	/// Connection establishment failed
	#[error("Failed to establish connection: {0}")]
	ConnectionEstablishment(#[from] ConnectionEstablishmentError),
}

//! # MQTT Session Client
//!
//! An MQTT client core that keeps a registry of topic filters and their
//! handlers, routes inbound messages with MQTT wildcard matching and re-arms
//! every filter whenever the broker session is re-established.
//!
//! ## Features
//!
//! - **Wildcard routing**: `+` matches one topic level, a trailing `#` matches
//!   the rest (including nothing)
//! - **Reconnect recovery**: every connect-complete resubscribes all filters
//!   before the application hook runs
//! - **Per-subscription errors**: transport failures are reported to the
//!   handler that owns the subscription, never dropped and never fatal
//! - **Explicit session**: credentials are passed in through
//!   [`Session`], nothing is read from global state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mqtt_session_client::{
//!     ConnectionHooks, FnHandler, MqttClient, MqttClientConfig, QoS, Session,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new("my_client", "system-key")
//!         .with_auth_token("token-from-auth");
//!     let mut config = MqttClientConfig::from_url("mqtt://localhost:1883", session)?;
//!     config.with_hooks(
//!         ConnectionHooks::new()
//!             .on_connection_complete(|reconnect, uri| println!("ready on {uri} ({reconnect})"))
//!             .on_connection_lost(|cause| eprintln!("connection lost: {cause}")),
//!     );
//!     let (client, connection) = MqttClient::connect_with_config(config).await?;
//!
//!     let handler = FnHandler::new()
//!         .on_text(|topic, text| println!("{topic}: {text}"))
//!         .into_ref();
//!     client.subscribe("sensors/+/temperature", QoS::AtLeastOnce, handler).await?;
//!
//!     client
//!         .publish("sensors/kitchen/temperature", "21.5", QoS::AtLeastOnce, false)
//!         .await?;
//!
//!     connection.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod connection;
pub mod routing;
pub mod topic;

pub use client::{
	ClientSettings, MqttClient, MqttClientConfig, MqttClientError, Session,
	qos_from_level,
};
pub use connection::{ConnectionHooks, ConnectionLost, MqttConnection};
pub use routing::{FnHandler, HandlerRef, MessageHandler, TransportError};
pub use rumqttc::QoS;
pub use topic::{TopicFilterError, matches};

/// Result type alias for operations that may fail with MqttClientError
pub type Result<T> = std::result::Result<T, MqttClientError>;

/// Essential types for most MQTT applications.
///
/// ```rust
/// use mqtt_session_client::prelude::*;
/// ```
pub mod prelude {
	pub use crate::{
		ConnectionHooks, ConnectionLost, FnHandler, HandlerRef, MessageHandler,
		MqttClient, MqttClientConfig, MqttClientError, MqttConnection, QoS,
		Result, Session, TransportError,
	};
}

/// Types for embedding the core behind a custom transport
pub mod advanced {
	pub use crate::connection::{
		LifecycleController, OnConnectionComplete, OnConnectionLost,
	};
	pub use crate::routing::{
		MessageDispatcher, ResubscribeOutcome, SubscriptionRegistry, Transport,
	};
	pub use crate::topic::{limits, validation};
}

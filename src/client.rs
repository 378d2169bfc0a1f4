//! MQTT client module
//!
//! This module provides the client facade, its configuration and the event
//! loop that feeds transport events into the subscription core.

/// Client facade over the subscription core
pub mod async_client;
pub mod config;
/// Client error types
pub mod error;
mod event_loop;


pub use async_client::MqttClient;
pub use config::{
	ClientSettings, DEFAULT_MESSAGING_URL, MqttClientConfig, Session,
	qos_from_level,
};
pub use error::{ConnectionEstablishmentError, MqttClientError};

//! Configuration for MQTT client initialization

use std::fmt;
use std::time::Duration;

use rumqttc::{MqttOptions, OptionError, QoS};
use url::Url;

use crate::MqttClientError;
use crate::connection::ConnectionHooks;

/// Messaging endpoint used when no URL is given
pub const DEFAULT_MESSAGING_URL: &str = "tcp://messaging.clearblade.com:1883";

/// Identity presented to the broker on every (re)connect.
///
/// Passed explicitly into [`MqttClientConfig`]; the client never reads
/// credentials from anywhere else. The auth token is sent as the MQTT user
/// name and the system key as the password.
#[derive(Clone)]
pub struct Session {
	/// MQTT client identifier
	pub client_id: String,
	/// Token obtained from the platform's authentication flow
	pub auth_token: Option<String>,
	/// Key of the system the client belongs to
	pub system_key: String,
}

impl Session {
	/// Session without an auth token
	pub fn new(client_id: impl Into<String>, system_key: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			auth_token: None,
			system_key: system_key.into(),
		}
	}

	/// Attaches the token returned by the authentication flow
	pub fn with_auth_token(mut self, auth_token: impl Into<String>) -> Self {
		self.auth_token = Some(auth_token.into());
		self
	}

	fn apply(&self, options: &mut MqttOptions) {
		if let Some(token) = &self.auth_token {
			options.set_credentials(token.clone(), self.system_key.clone());
		}
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("client_id", &self.client_id)
			.field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
			.field("system_key", &self.system_key)
			.finish()
	}
}

/// Client-level behavior settings
#[derive(Debug, Clone)]
pub struct ClientSettings {
	/// Capacity of the rumqttc request channel
	pub event_loop_capacity: usize,
	/// How long to wait for the first CONNACK
	pub connection_timeout_millis: u64,
	/// Consecutive poll errors after which the event loop gives up
	pub max_consecutive_errors: u32,
	/// First back-off delay after a poll error
	pub initial_retry_delay_millis: u64,
	/// Upper bound for the back-off delay
	pub max_retry_delay_millis: u64,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			event_loop_capacity: 10,
			connection_timeout_millis: 5000,
			max_consecutive_errors: 10,
			initial_retry_delay_millis: 100,
			max_retry_delay_millis: 30_000,
		}
	}
}

impl ClientSettings {
	/// Back-off before the next poll after `error_count` consecutive errors
	pub fn retry_delay(&self, error_count: u32) -> Duration {
		let initial = Duration::from_millis(self.initial_retry_delay_millis);
		let delay = initial * 2_u32.pow(error_count.saturating_sub(1).min(10));
		delay.min(Duration::from_millis(self.max_retry_delay_millis))
	}
}

/// Configuration for MQTT client creation
#[derive(Debug, Clone)]
pub struct MqttClientConfig {
	/// Underlying MQTT connection options (from rumqttc)
	pub connection: MqttOptions,
	/// Client-level behavior settings
	pub settings: ClientSettings,
	session: Session,
	server_uri: String,
	hooks: ConnectionHooks,
}

impl MqttClientConfig {
	/// Create config with default settings
	pub fn new(session: Session, host: &str, port: u16) -> Self {
		let mut connection = MqttOptions::new(session.client_id.clone(), host, port);
		session.apply(&mut connection);
		Self {
			connection,
			settings: ClientSettings::default(),
			session,
			server_uri: format!("tcp://{host}:{port}"),
			hooks: ConnectionHooks::default(),
		}
	}

	/// Parse configuration from MQTT URL
	///
	/// Supports: tcp://, mqtt://, ssl://, mqtts://. The session's client id
	/// is added as a query parameter unless the URL already names one.
	pub fn from_url(url: &str, session: Session) -> Result<Self, OptionError> {
		let mut parsed = Url::parse(url)?;
		let has_client_id = parsed.query_pairs().any(|(key, _)| key == "client_id");
		if !has_client_id {
			parsed
				.query_pairs_mut()
				.append_pair("client_id", &session.client_id);
		}
		let mut connection = MqttOptions::try_from(parsed)?;
		session.apply(&mut connection);
		Ok(Self {
			connection,
			settings: ClientSettings::default(),
			session,
			server_uri: url.to_string(),
			hooks: ConnectionHooks::default(),
		})
	}

	/// Config for [`DEFAULT_MESSAGING_URL`]
	pub fn default_endpoint(session: Session) -> Result<Self, OptionError> {
		Self::from_url(DEFAULT_MESSAGING_URL, session)
	}

	/// Create config for localhost:1883
	pub fn localhost(session: Session) -> Self {
		Self::new(session, "localhost", 1883)
	}

	/// Sets the keep-alive interval
	pub fn with_keep_alive(&mut self, keep_alive: Duration) -> &mut Self {
		self.connection.set_keep_alive(keep_alive);
		self
	}

	/// Requests a clean (non-persistent) session from the broker
	pub fn with_clean_session(&mut self, clean_session: bool) -> &mut Self {
		self.connection.set_clean_session(clean_session);
		self
	}

	/// Lifecycle hooks installed before the event loop starts, so the first
	/// connect-complete already reaches them
	pub fn with_hooks(&mut self, hooks: ConnectionHooks) -> &mut Self {
		self.hooks = hooks;
		self
	}

	/// Hooks the client starts with
	pub fn hooks(&self) -> &ConnectionHooks {
		&self.hooks
	}

	/// Session the client authenticates with
	pub fn session(&self) -> &Session {
		&self.session
	}

	/// URI reported to connect-complete hooks
	pub fn server_uri(&self) -> &str {
		&self.server_uri
	}
}

/// Maps a numeric QoS level to [`QoS`]
pub fn qos_from_level(level: u8) -> Result<QoS, MqttClientError> {
	match level {
		| 0 => Ok(QoS::AtMostOnce),
		| 1 => Ok(QoS::AtLeastOnce),
		| 2 => Ok(QoS::ExactlyOnce),
		| other => Err(MqttClientError::InvalidQos(other)),
	}
}

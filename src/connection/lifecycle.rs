//! Connection lifecycle controller
//!
//! Observes connect-complete and connection-lost signals from the transport.
//! Every connect-complete re-arms all registered filters before the
//! application hook runs. Connection loss is only reported; reconnecting is
//! left to the transport.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use crate::routing::{ResubscribeOutcome, SubscriptionRegistry};

/// Why the transport reported the connection as down
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionLost {
	/// Network or protocol failure while polling the connection
	#[error("Network connection lost: {0}")]
	Network(String),

	/// Broker sent DISCONNECT
	#[error("Broker closed the session")]
	ServerDisconnect,
}

/// Hook run after a session is (re)established: `(is_reconnect, server_uri)`
pub type OnConnectionComplete = Arc<dyn Fn(bool, &str) + Send + Sync>;

/// Hook run when the transport reports the connection as down
pub type OnConnectionLost = Arc<dyn Fn(&ConnectionLost) + Send + Sync>;

/// Application hooks for connection lifecycle events.
///
/// Pass them in through
/// [`MqttClientConfig::with_hooks`](crate::MqttClientConfig::with_hooks) so
/// they are in place before the first connect-complete fires.
#[derive(Clone, Default)]
pub struct ConnectionHooks {
	on_complete: Option<OnConnectionComplete>,
	on_lost: Option<OnConnectionLost>,
}

impl ConnectionHooks {
	/// No hooks set
	pub fn new() -> Self {
		Self::default()
	}

	/// Hook run after every (re)connect, once subscriptions are restored
	pub fn on_connection_complete<F>(mut self, hook: F) -> Self
	where F: Fn(bool, &str) + Send + Sync + 'static {
		self.on_complete = Some(Arc::new(hook));
		self
	}

	/// Hook run when the connection drops
	pub fn on_connection_lost<F>(mut self, hook: F) -> Self
	where F: Fn(&ConnectionLost) + Send + Sync + 'static {
		self.on_lost = Some(Arc::new(hook));
		self
	}
}

impl fmt::Debug for ConnectionHooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectionHooks")
			.field("on_complete", &self.on_complete.is_some())
			.field("on_lost", &self.on_lost.is_some())
			.finish()
	}
}

/// Reacts to transport lifecycle signals on behalf of one client.
pub struct LifecycleController {
	registry: Arc<SubscriptionRegistry>,
	hooks: Mutex<ConnectionHooks>,
}

impl LifecycleController {
	/// Creates a controller restoring subscriptions held by `registry`
	pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
		Self {
			registry,
			hooks: Mutex::new(ConnectionHooks::default()),
		}
	}

	/// Replaces every hook with the ones set in `hooks`
	pub fn install_hooks(&self, hooks: ConnectionHooks) {
		*self.hooks() = hooks;
	}

	/// Sets the connect-complete hook, replacing any previous one
	pub fn set_on_connection_complete<F>(&self, hook: F)
	where F: Fn(bool, &str) + Send + Sync + 'static {
		self.hooks().on_complete = Some(Arc::new(hook));
	}

	/// Sets the connection-lost hook, replacing any previous one
	pub fn set_on_connection_lost<F>(&self, hook: F)
	where F: Fn(&ConnectionLost) + Send + Sync + 'static {
		self.hooks().on_lost = Some(Arc::new(hook));
	}

	/// Resubscribes every registered filter, then runs the
	/// connect-complete hook.
	pub async fn connect_complete(
		&self,
		is_reconnect: bool,
		server_uri: &str,
	) -> ResubscribeOutcome {
		info!(is_reconnect, server_uri = %server_uri, "MQTT session established");
		let outcome = self.registry.resubscribe().await;
		if outcome.failed > 0 {
			warn!(
				failed = outcome.failed,
				attempted = outcome.attempted,
				"Some subscriptions could not be restored"
			);
		}

		let hook = self.hooks().on_complete.clone();
		if let Some(hook) = hook {
			hook(is_reconnect, server_uri);
		}
		outcome
	}

	/// Forwards `cause` to the connection-lost hook
	pub fn connection_lost(&self, cause: &ConnectionLost) {
		warn!(cause = %cause, "MQTT connection lost");
		let hook = self.hooks().on_lost.clone();
		if let Some(hook) = hook {
			hook(cause);
		}
	}

	fn hooks(&self) -> std::sync::MutexGuard<'_, ConnectionHooks> {
		// Hooks hold no invariants a panicking writer could break.
		self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

//! Handler capability attached to every subscription

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use super::error::TransportError;

/// Receives the messages routed to one topic filter.
///
/// Each delivery calls [`done_bytes`](Self::done_bytes) and then
/// [`done_text`](Self::done_text) for the same message. Callbacks run on the
/// task that delivered the event and no registry lock is held while they
/// run, so a handler may spawn work that subscribes or unsubscribes.
pub trait MessageHandler: Send + Sync + 'static {
	/// Raw payload as received from the broker
	fn done_bytes(&self, _topic: &str, _payload: &Bytes) {}

	/// Payload decoded as UTF-8, invalid sequences replaced
	fn done_text(&self, _topic: &str, _text: &str) {}

	/// A transport request made on behalf of this subscription failed
	fn error(&self, cause: &TransportError) {
		warn!(error = %cause, "Unhandled subscription error");
	}
}

/// Shared handler reference as stored in the registry
pub type HandlerRef = Arc<dyn MessageHandler>;

type BytesCallback = Box<dyn Fn(&str, &Bytes) + Send + Sync>;
type TextCallback = Box<dyn Fn(&str, &str) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&TransportError) + Send + Sync>;

/// [`MessageHandler`] assembled from closures.
///
/// ```
/// use mqtt_session_client::FnHandler;
///
/// let handler = FnHandler::new()
/// 	.on_text(|topic, text| println!("{topic}: {text}"))
/// 	.on_error(|err| eprintln!("subscription failed: {err}"));
/// ```
#[derive(Default)]
pub struct FnHandler {
	on_bytes: Option<BytesCallback>,
	on_text: Option<TextCallback>,
	on_error: Option<ErrorCallback>,
}

impl FnHandler {
	/// Handler that ignores every notification
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the raw payload callback
	pub fn on_bytes<F>(mut self, callback: F) -> Self
	where F: Fn(&str, &Bytes) + Send + Sync + 'static {
		self.on_bytes = Some(Box::new(callback));
		self
	}

	/// Sets the decoded text callback
	pub fn on_text<F>(mut self, callback: F) -> Self
	where F: Fn(&str, &str) + Send + Sync + 'static {
		self.on_text = Some(Box::new(callback));
		self
	}

	/// Sets the error callback
	pub fn on_error<F>(mut self, callback: F) -> Self
	where F: Fn(&TransportError) + Send + Sync + 'static {
		self.on_error = Some(Box::new(callback));
		self
	}

	/// Wraps the handler for registration
	pub fn into_ref(self) -> HandlerRef {
		Arc::new(self)
	}
}

impl MessageHandler for FnHandler {
	fn done_bytes(&self, topic: &str, payload: &Bytes) {
		if let Some(callback) = &self.on_bytes {
			callback(topic, payload);
		}
	}

	fn done_text(&self, topic: &str, text: &str) {
		if let Some(callback) = &self.on_text {
			callback(topic, text);
		}
	}

	fn error(&self, cause: &TransportError) {
		match &self.on_error {
			| Some(callback) => callback(cause),
			| None => warn!(error = %cause, "Unhandled subscription error"),
		}
	}
}

impl fmt::Debug for FnHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnHandler")
			.field("on_bytes", &self.on_bytes.is_some())
			.field("on_text", &self.on_text.is_some())
			.field("on_error", &self.on_error.is_some())
			.finish()
	}
}

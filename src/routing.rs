//! Message routing and subscription management module
//!
//! This module owns the subscription registry, the transport seam it drives
//! and the dispatcher that routes inbound messages to handlers.

pub mod dispatcher;
/// Routing and transport error types
pub mod error;
pub mod handler;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod registry_tests;
#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::MessageDispatcher;
pub use error::TransportError;
pub use handler::{FnHandler, HandlerRef, MessageHandler};
pub use registry::{ResubscribeOutcome, SubscriptionRegistry};
pub use transport::Transport;

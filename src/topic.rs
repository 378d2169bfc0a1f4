//! Topic handling module
//!
//! This module provides the MQTT topic filter matcher used for routing
//! inbound messages, together with filter and topic validation.

pub mod error;
pub mod topic_matcher;


pub use error::{FilterResult, TopicFilterError, limits, validation};
pub use topic_matcher::matches;

//! Error types and utilities for the topic module
//!
//! Holds the filter validation error, the shared size limits and the
//! validation helpers applied before a filter is registered or a topic is
//! published to.

use thiserror::Error;

/// Errors produced while validating topic filters and publish topics
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicFilterError {
	/// Empty filter or topic
	#[error("Topic filter cannot be empty")]
	Empty,

	/// Hash wildcard (#) used not at the end of the filter
	#[error(
		"Invalid topic filter '{filter}': # wildcard can only be the last \
		 segment"
	)]
	HashPosition {
		/// The invalid filter
		filter: String,
	},

	/// Wildcard characters mixed into a segment, e.g. `a+` or `b#`
	#[error("Invalid wildcard usage in segment '{segment}' of '{filter}'")]
	WildcardUsage {
		/// The invalid filter
		filter: String,
		/// Offending segment
		segment: String,
	},

	/// Publish topics must be concrete
	#[error("Topic '{topic}' contains wildcard characters ('+' or '#')")]
	WildcardInTopic {
		/// The invalid topic
		topic: String,
	},

	/// Filter or topic longer than `limits::MAX_TOPIC_LENGTH`
	#[error("Topic is too long: {length} > {max}")]
	TooLong {
		/// Actual length in bytes
		length: usize,
		/// Allowed maximum
		max: usize,
	},

	/// Filter or topic deeper than `limits::MAX_TOPIC_DEPTH`
	#[error("Topic is too deep: {depth} segments > {max}")]
	TooDeep {
		/// Actual segment count
		depth: usize,
		/// Allowed maximum
		max: usize,
	},

	/// Null character anywhere in the string
	#[error("Topic '{topic}' contains a null byte")]
	NullByte {
		/// The invalid topic or filter
		topic: String,
	},
}

impl TopicFilterError {
	/// Creates a new HashPosition error
	pub fn hash_position(filter: impl Into<String>) -> Self {
		Self::HashPosition {
			filter: filter.into(),
		}
	}

	/// Creates a new WildcardUsage error
	pub fn wildcard_usage(
		filter: impl Into<String>,
		segment: impl Into<String>,
	) -> Self {
		Self::WildcardUsage {
			filter: filter.into(),
			segment: segment.into(),
		}
	}
}

/// Convenient Result type for filter validation
pub type FilterResult<T> = Result<T, TopicFilterError>;

/// Topic processing limits and constants
pub mod limits {
	/// Maximum topic nesting depth allowed
	pub const MAX_TOPIC_DEPTH: usize = 32;

	/// Maximum total topic length, the MQTT string length limit
	pub const MAX_TOPIC_LENGTH: usize = 65535;
}

/// Validation utilities for topic operations
pub mod validation {
	use super::limits::*;
	use super::{FilterResult, TopicFilterError};

	fn validate_common(value: &str) -> FilterResult<()> {
		if value.is_empty() {
			return Err(TopicFilterError::Empty);
		}

		if value.len() > MAX_TOPIC_LENGTH {
			return Err(TopicFilterError::TooLong {
				length: value.len(),
				max: MAX_TOPIC_LENGTH,
			});
		}

		if value.contains('\0') {
			return Err(TopicFilterError::NullByte {
				topic: value.to_string(),
			});
		}

		let depth = value.split('/').count();
		if depth > MAX_TOPIC_DEPTH {
			return Err(TopicFilterError::TooDeep {
				depth,
				max: MAX_TOPIC_DEPTH,
			});
		}

		Ok(())
	}

	/// Validates a subscription filter.
	///
	/// `+` and `#` must occupy a whole segment and `#` must be the last one.
	pub fn validate_filter(filter: &str) -> FilterResult<()> {
		validate_common(filter)?;

		let mut segments = filter.split('/').peekable();
		while let Some(segment) = segments.next() {
			match segment {
				| "#" if segments.peek().is_some() => {
					return Err(TopicFilterError::hash_position(filter));
				}
				| "#" | "+" => {}
				| other if other.contains(['+', '#']) => {
					return Err(TopicFilterError::wildcard_usage(filter, other));
				}
				| _ => {}
			}
		}

		Ok(())
	}

	/// Validates a concrete topic used for publishing
	pub fn validate_topic(topic: &str) -> FilterResult<()> {
		validate_common(topic)?;

		if topic.contains(['+', '#']) {
			return Err(TopicFilterError::WildcardInTopic {
				topic: topic.to_string(),
			});
		}

		Ok(())
	}
}

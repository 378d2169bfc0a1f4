//! Wildcard matching of MQTT topic filters against concrete topics

/// Returns `true` when `topic` is matched by `filter`.
///
/// Both strings are split on `/` and compared segment by segment:
/// `+` matches exactly one segment (an empty one included), a trailing `#`
/// matches the rest of the topic including nothing at all, and every other
/// segment must be equal. A `#` that is not the last filter segment never
/// matches.
///
/// ```
/// use mqtt_session_client::topic::matches;
///
/// assert!(matches("level/+/topic", "level/anything/topic"));
/// assert!(!matches("level/+/topic", "level/a/b/topic"));
/// assert!(matches("multi/#", "multi"));
/// ```
pub fn matches(filter: &str, topic: &str) -> bool {
	let filter_segments: Vec<&str> = filter.split('/').collect();
	let topic_segments: Vec<&str> = topic.split('/').collect();
	match_segments(&filter_segments, &topic_segments)
}

fn match_segments(filter: &[&str], topic: &[&str]) -> bool {
	match (filter, topic) {
		| (["#"], _) => true,
		| (["#", ..], _) => false,
		| ([], []) => true,
		| ([], _) | (_, []) => false,
		| (["+", rest_filter @ ..], [_, rest_topic @ ..]) => {
			match_segments(rest_filter, rest_topic)
		}
		| ([expected, rest_filter @ ..], [segment, rest_topic @ ..]) => {
			expected == segment && match_segments(rest_filter, rest_topic)
		}
	}
}

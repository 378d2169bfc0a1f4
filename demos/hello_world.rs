//! Subscribes with wildcards, publishes a few messages and prints what
//! arrives. Kill the broker and restart it to watch the subscriptions come
//! back.
//!
//! ```bash
//! RUST_LOG=info MQTT_URL=mqtt://localhost:1883 cargo run --example hello_world
//! ```

use std::time::Duration;

use mqtt_session_client::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn setup_tracing() {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| "info".into());
	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_target(true)
				.compact(),
		)
		.init();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
	setup_tracing();

	let url = std::env::var("MQTT_URL")
		.unwrap_or_else(|_| "mqtt://localhost:1883".to_string());
	let mut session = Session::new("hello-world-demo", "demo-system-key");
	if let Ok(token) = std::env::var("MQTT_AUTH_TOKEN") {
		session = session.with_auth_token(token);
	}

	let hooks = ConnectionHooks::new()
		.on_connection_complete(|is_reconnect, uri| {
			println!("session ready on {uri} (reconnect: {is_reconnect})");
		})
		.on_connection_lost(|cause| println!("connection lost: {cause}"));
	let mut config = MqttClientConfig::from_url(&url, session)?;
	config
		.with_keep_alive(Duration::from_secs(10))
		.with_hooks(hooks);
	let (client, connection) = MqttClient::connect_with_config(config).await?;

	let handler = FnHandler::new()
		.on_text(|topic, text| println!("{topic} -> {text}"))
		.on_error(|err| eprintln!("subscription failed: {err}"))
		.into_ref();
	client
		.subscribe("hello/+/greeting", QoS::AtLeastOnce, handler.clone())
		.await?;
	client.subscribe("hello/#", QoS::AtMostOnce, handler).await?;

	for i in 0 .. 5 {
		client
			.publish(
				"hello/world/greeting",
				format!("hello #{i}"),
				QoS::AtLeastOnce,
				false,
			)
			.await?;
		tokio::time::sleep(Duration::from_secs(1)).await;
	}

	client.unsubscribe("hello/#").await;
	connection.shutdown().await?;
	Ok(())
}

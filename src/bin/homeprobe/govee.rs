// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::time::Duration;

use clap::Subcommand;
use homeprobe::credentials::{CredentialStore, keys};
use homeprobe::govee::{
    self, DeviceCategory, DeviceInfo, Event, GoveeClient, polls_per_hour_per_device,
};
use homeprobe::protocol::{MqttSubscriber, topic_matches};
use homeprobe::{ChangeDetector, ConsoleSink, DeviceEvent, ProtocolError, Result};

use crate::ticker::{Ticker, shutdown_signal};

const API_KEY_HINT: &str = "request an API key in the Govee Home app (Profile > Settings > Apply for API Key)";

#[derive(Subcommand)]
pub enum Command {
    /// List devices grouped by category
    Devices,
    /// Stream account events over MQTT
    Listen,
    /// Poll light state and print changes
    Poll {
        /// Seconds between polls
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

pub async fn run(command: Command, store: &CredentialStore) -> Result<()> {
    let api_key = store.require(keys::GOVEE_API_KEY, API_KEY_HINT)?;
    match command {
        Command::Devices => devices(&api_key).await,
        Command::Listen => listen(&api_key).await,
        Command::Poll { interval } => poll(&api_key, Duration::from_secs(interval.max(1))).await,
    }
}

async fn devices(api_key: &str) -> Result<()> {
    let devices = GoveeClient::new(api_key)?.devices().await?;
    println!("Found {} devices", devices.len());

    let mut by_category: BTreeMap<DeviceCategory, Vec<&DeviceInfo>> = BTreeMap::new();
    for device in &devices {
        by_category.entry(device.category()).or_default().push(device);
    }

    for (category, members) in &by_category {
        println!();
        println!("{category} ({}):", members.len());
        for device in members {
            println!("  {} [{}]", device.display_name(), device.sku);
            println!("    Device: {}", device.device);
            let events: Vec<&str> = device
                .capabilities
                .iter()
                .filter(|c| c.is_event())
                .map(|c| c.instance.as_str())
                .collect();
            if !events.is_empty() {
                println!("    Events: {}", events.join(", "));
            }
        }
    }

    let with_events = devices.iter().filter(|d| d.supports_events()).count();
    println!();
    println!("{with_events} of {} devices publish MQTT events", devices.len());
    Ok(())
}

async fn listen(api_key: &str) -> Result<()> {
    let mut subscriber = MqttSubscriber::connect(govee::mqtt_config(api_key)).await?;
    println!(
        "Listening for Govee events on GA/{} (Ctrl+C to stop)",
        govee::redact_key(api_key)
    );

    let mut shutdown = shutdown_signal();
    loop {
        tokio::select! {
            message = subscriber.next_message() => {
                let Some(message) = message else {
                    return Err(ProtocolError::ConnectionFailed("MQTT connection closed".to_string()).into());
                };
                if !topic_matches(subscriber.topic(), &message.topic) {
                    continue;
                }
                println!("Raw: {}", message.payload_text());
                match message.json::<Event>() {
                    Ok(event) => print_event(&event),
                    Err(e) => tracing::warn!(error = %e, "Failed to parse Govee event"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Stopping");
                break;
            }
        }
    }

    subscriber.disconnect().await?;
    Ok(())
}

fn print_event(event: &Event) {
    println!(
        "Event from {} [{}]",
        event.device_label(),
        event.sku.as_deref().unwrap_or("?")
    );
    for capability in &event.capabilities {
        println!("  {} ({})", capability.instance, capability.capability_type);
        for state in &capability.state {
            let name = state.name.as_deref().unwrap_or("-");
            match &state.message {
                Some(message) => println!("    {name}: {} ({message})", state.value),
                None => println!("    {name}: {}", state.value),
            }
        }
    }
}

async fn poll(api_key: &str, interval: Duration) -> Result<()> {
    let client = GoveeClient::new(api_key)?;
    let lights: Vec<DeviceInfo> = client
        .devices()
        .await?
        .into_iter()
        .filter(|d| d.category() == DeviceCategory::Light)
        .collect();

    if lights.is_empty() {
        println!("No lights to poll.");
        return Ok(());
    }

    let budget = polls_per_hour_per_device(lights.len());
    let planned = 3600 / interval.as_secs().max(1);
    println!(
        "Polling {} lights every {}s ({planned} requests/hour per light, budget {budget})",
        lights.len(),
        interval.as_secs()
    );
    if planned > u64::from(budget) {
        tracing::warn!(
            planned,
            budget,
            daily_limit = GoveeClient::DAILY_REQUEST_LIMIT,
            "Poll rate exceeds the daily request budget"
        );
    }

    let mut detector = ChangeDetector::new();
    let mut sink = ConsoleSink::stdout();
    let mut ticker = Ticker::new(interval);

    while ticker.tick().await {
        for light in &lights {
            let key = govee::device_key(light);
            let result = client.device_state(&light.sku, &light.device).await;
            let (snapshot, liveness) = govee::observe(&key, result);
            let events = DeviceEvent::from_poll(&mut detector, &key, snapshot, liveness);
            sink.record_all(&events);
        }
    }
    Ok(())
}

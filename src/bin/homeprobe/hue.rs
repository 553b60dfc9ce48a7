// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::time::Duration;

use clap::Subcommand;
use homeprobe::credentials::{CredentialStore, keys};
use homeprobe::hue::{
    self, CALLBACK_TIMEOUT, DEFAULT_CALLBACK_PORT, HueClient, HueMonitor, Light, Pkce, Sensor,
    TokenExchange,
};
use homeprobe::protocol::HttpConfig;
use homeprobe::{ChangeDetector, ConsoleSink, Result};
use serde_json::Value;

use crate::ticker::Ticker;

const APP_HINT: &str = "register a remote app at https://developers.meethue.com/my-apps/";

#[derive(Subcommand)]
pub enum Command {
    /// Authorize via OAuth (PKCE) and save the tokens
    Auth {
        /// Local port for the OAuth redirect
        #[arg(long, default_value_t = DEFAULT_CALLBACK_PORT)]
        port: u16,
    },
    /// List lights, rooms and sensors
    Devices,
    /// Poll lights and print every change
    Poll {
        /// Seconds between polls
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
    /// Watch lights and sensors and print significant changes
    Listen {
        /// Seconds between polls
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

pub async fn run(command: Command, store: &mut CredentialStore) -> Result<()> {
    match command {
        Command::Auth { port } => auth(store, port).await,
        Command::Devices => devices(&authorized_client(store)?).await,
        Command::Poll { interval } => {
            poll(&authorized_client(store)?, Duration::from_secs(interval.max(1))).await
        }
        Command::Listen { interval } => {
            listen(&authorized_client(store)?, Duration::from_secs(interval.max(1))).await
        }
    }
}

fn authorized_client(store: &CredentialStore) -> Result<HueClient> {
    let token = store.require(keys::HUE_ACCESS_TOKEN, "run `homeprobe hue auth` first")?;
    HueClient::new(token)
}

async fn auth(store: &mut CredentialStore, port: u16) -> Result<()> {
    let client_id = store.require(keys::HUE_CLIENT_ID, APP_HINT)?;
    let client_secret = store.require(keys::HUE_CLIENT_SECRET, APP_HINT)?;
    let redirect_uri = format!("http://localhost:{port}/callback");

    let pkce = Pkce::generate();
    let http = HttpConfig::new(HueClient::BASE_URL).into_client()?;
    let listener = hue::bind_callback(port).await?;

    println!("Open this URL in your browser to authorize access:");
    println!();
    println!("  {}", hue::authorization_url(&client_id, &redirect_uri, &pkce.challenge));
    println!();
    println!("Waiting for the redirect on {redirect_uri} ...");

    let tokens = hue::serve_callback(listener, CALLBACK_TIMEOUT, move |code| async move {
        let exchange = TokenExchange {
            code: &code,
            verifier: &pkce.verifier,
            client_id: &client_id,
            client_secret: &client_secret,
            redirect_uri: &redirect_uri,
        };
        hue::exchange_code(&http, &exchange).await
    })
    .await?;

    let mut entries = vec![(keys::HUE_ACCESS_TOKEN, tokens.access_token.as_str())];
    if let Some(refresh) = &tokens.refresh_token {
        entries.push((keys::HUE_REFRESH_TOKEN, refresh.as_str()));
    }
    store.persist(&entries)?;

    println!("Tokens saved.");
    if let Some(expires_in) = tokens.expires_in {
        println!("Access token expires in {} hours", expires_in / 3600);
    }
    Ok(())
}

async fn devices(client: &HueClient) -> Result<()> {
    let config = match client.config().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Bridge config unavailable, falling back to CLIP v2 resources");
            return list_resources(client).await;
        }
    };

    if let Some(name) = config.get("name").and_then(Value::as_str) {
        println!("Bridge: {name}");
    }

    let lights = client.lights().await?;
    print_lights(&lights);

    let groups = client.groups().await?;
    println!();
    println!("Rooms and zones ({}):", groups.len());
    for (id, group) in &groups {
        println!(
            "  [{id}] {} ({}) lights: {}",
            group.name,
            group.group_type,
            group.lights.join(", ")
        );
    }

    let sensors = client.sensors().await?;
    print_sensors(&sensors);
    Ok(())
}

fn print_lights(lights: &BTreeMap<String, Light>) {
    println!();
    println!("Lights ({}):", lights.len());
    for (id, light) in lights {
        println!("  [{id}] {} ({})", light.name, light.light_type);
        if let Some(model) = &light.modelid {
            println!("    Model: {model}");
        }
        println!(
            "    On: {}  Brightness: {}  Reachable: {}",
            light.is_on().map_or_else(|| "?".to_string(), |on| on.to_string()),
            light.brightness().map_or_else(|| "?".to_string(), |b| b.to_string()),
            light.reachable()
        );
    }
}

fn print_sensors(sensors: &BTreeMap<String, Sensor>) {
    let relevant: Vec<_> = sensors.iter().filter(|(_, s)| s.is_relevant()).collect();
    println!();
    println!("Sensors ({} of {}):", relevant.len(), sensors.len());
    for (id, sensor) in relevant {
        println!("  [{id}] {} ({})", sensor.name, sensor.sensor_type);
        if let Some(presence) = sensor.presence() {
            println!("    Presence: {presence}");
        }
        if let Some(temperature) = sensor.state.get("temperature").and_then(hue::describe_temperature) {
            println!("    Temperature: {temperature}");
        }
        if let Some(level) = sensor.light_level() {
            println!("    Light level: {level}");
        }
        if let Some(open) = sensor.open() {
            println!("    {}", if open { "Open" } else { "Closed" });
        }
        if let Some(updated) = sensor.last_updated() {
            println!("    Last updated: {updated}");
        }
        println!("    Reachable: {}", sensor.reachable());
        if let Some(battery) = sensor.battery() {
            println!("    Battery: {battery}%");
        }
    }
}

async fn list_resources(client: &HueClient) -> Result<()> {
    let resources = client.resources().await?;
    let sensors = resources.sensors();
    println!("Sensor resources ({}):", sensors.len());
    for (resource, owner) in sensors {
        println!(
            "  {} [{}] on {}",
            resource.id,
            resource.resource_type,
            owner.unwrap_or("unknown device")
        );
        if let Some(motion) = resource.motion_detected() {
            println!("    Motion: {motion}");
        }
    }
    Ok(())
}

async fn poll(client: &HueClient, interval: Duration) -> Result<()> {
    println!("Polling Hue lights every {}s (Ctrl+C to stop)", interval.as_secs());

    let mut detector = ChangeDetector::new();
    let mut sink = ConsoleSink::stdout();
    let mut ticker = Ticker::new(interval);

    while ticker.tick().await {
        let events = match client.lights().await {
            Ok(lights) => hue::observe_lights(&mut detector, &lights),
            Err(e) => {
                tracing::warn!(error = %e, "Hue poll failed, marking lights offline");
                hue::observe_failure(&mut detector)
            }
        };
        sink.record_all(&events);
    }
    Ok(())
}

async fn listen(client: &HueClient, interval: Duration) -> Result<()> {
    let relevant = |sensors: BTreeMap<String, Sensor>| -> BTreeMap<String, Sensor> {
        sensors.into_iter().filter(|(_, s)| s.is_relevant()).collect()
    };

    let (lights, sensors) = client.lights_and_sensors().await?;
    let mut monitor = HueMonitor::new();
    let (light_count, sensor_count) = monitor.capture_baseline(&lights, &relevant(sensors));
    println!(
        "Baseline captured for {light_count} lights and {sensor_count} sensors; checking every {}s (Ctrl+C to stop)",
        interval.as_secs()
    );

    let mut sink = ConsoleSink::stdout();
    let mut ticker = Ticker::delayed(interval);

    while ticker.tick().await {
        let events = match client.lights_and_sensors().await {
            Ok((lights, sensors)) => monitor.observe(&lights, &relevant(sensors)),
            Err(e) => {
                tracing::warn!(error = %e, "Hue poll failed, marking devices offline");
                monitor.observe_failure()
            }
        };
        sink.record_all(&events);
    }
    Ok(())
}

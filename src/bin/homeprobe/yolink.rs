// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{SecondsFormat, Utc};
use clap::Subcommand;
use homeprobe::credentials::{CredentialStore, keys};
use homeprobe::protocol::{MqttSubscriber, topic_matches};
use homeprobe::yolink::{self, Report, YoLinkClient};
use homeprobe::{ProtocolError, Result};

use crate::ticker::shutdown_signal;

const CREDENTIALS_HINT: &str = "create an app in the YoLink mobile app (Settings > Account > Advanced Settings > User Access Credentials)";

#[derive(Subcommand)]
pub enum Command {
    /// Exchange UAID and secret for an access token and save it
    Auth,
    /// Fetch the home id and save it
    Home,
    /// List door sensors (or every device if there are none)
    Devices,
    /// Stream door sensor reports over MQTT
    Listen,
    /// Check that the saved access token is still accepted
    CheckToken,
}

pub async fn run(command: Command, store: &mut CredentialStore) -> Result<()> {
    match command {
        Command::Auth => auth(store).await,
        Command::Home => home(store).await,
        Command::Devices => devices(store).await,
        Command::Listen => listen(store).await,
        Command::CheckToken => check_token(store).await,
    }
}

fn authorized_client(store: &CredentialStore) -> Result<YoLinkClient> {
    let token = store.require(keys::YOSMART_ACCESS_TOKEN, "run `homeprobe yolink auth` first")?;
    Ok(YoLinkClient::new()?.with_token(token))
}

async fn auth(store: &mut CredentialStore) -> Result<()> {
    let uaid = store.require(keys::YOSMART_UAID, CREDENTIALS_HINT)?;
    let secret = store.require(keys::YOSMART_SECRET, CREDENTIALS_HINT)?;

    let token = YoLinkClient::new()?.request_token(&uaid, &secret).await?;
    store.persist(&[(keys::YOSMART_ACCESS_TOKEN, token.as_str())])?;

    println!("Access token obtained and saved as {}", keys::YOSMART_ACCESS_TOKEN);
    Ok(())
}

async fn home(store: &mut CredentialStore) -> Result<()> {
    let info = authorized_client(store)?.home_info().await?;
    store.persist(&[(keys::YOSMART_HOME_ID, info.id.as_str())])?;

    println!("Home ID: {}", info.id);
    println!("Saved as {}", keys::YOSMART_HOME_ID);
    Ok(())
}

async fn devices(store: &CredentialStore) -> Result<()> {
    let devices = authorized_client(store)?.devices().await?;
    let doors: Vec<_> = devices.iter().filter(|d| d.is_door_sensor()).collect();

    let (title, shown) = if doors.is_empty() {
        println!("No door sensors found.");
        ("All devices", devices.iter().collect::<Vec<_>>())
    } else {
        ("Door sensors", doors)
    };

    println!("{title} ({}):", shown.len());
    for device in shown {
        println!("  {} [{}]", device.name, device.device_type);
        println!("    ID: {}", device.device_id);
    }
    Ok(())
}

async fn listen(store: &CredentialStore) -> Result<()> {
    let token = store.require(keys::YOSMART_ACCESS_TOKEN, "run `homeprobe yolink auth` first")?;
    let home_id = store.require(keys::YOSMART_HOME_ID, "run `homeprobe yolink home` first")?;

    let config = yolink::mqtt_config(&token, &home_id);
    let mut subscriber = MqttSubscriber::connect(config).await?;
    println!("Listening for door sensor events on {} (Ctrl+C to stop)", subscriber.topic());

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
                match message.json::<Report>() {
                    Ok(report) if report.is_door_sensor() => {
                        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                        println!(
                            "[{now}] Door sensor {} -> {}",
                            report.device_label(),
                            report.state_display()
                        );
                    }
                    Ok(report) => tracing::debug!(event = ?report.event, "Ignoring non door sensor report"),
                    Err(e) => tracing::warn!(topic = %message.topic, error = %e, "Unparseable report"),
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

async fn check_token(store: &CredentialStore) -> Result<()> {
    let info = authorized_client(store)?.home_info().await?;
    println!("Token is valid (home {})", info.id);
    Ok(())
}

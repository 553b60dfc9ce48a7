// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT subscriber for vendor push channels.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

use rumqttc::{AsyncClient, ConnectReturnCode, EventLoop, MqttOptions, QoS, Transport};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{ParseError, ProtocolError};

/// Largest packet accepted from vendor brokers.
const MAX_PACKET_SIZE: usize = 256 * 1024;

// ============================================================================
// MqttConfig
// ============================================================================

/// Connection settings for an [`MqttSubscriber`].
///
/// # Examples
///
/// ```
/// use homeprobe::protocol::MqttConfig;
///
/// let config = MqttConfig::new("mqtts://mqtt.openapi.govee.com:8883", "GA/my-key")
///     .with_credentials("my-key", "my-key");
///
/// assert_eq!(config.topic(), "GA/my-key");
/// ```
#[derive(Debug, Clone)]
pub struct MqttConfig {
    broker: String,
    topic: String,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Duration,
    connect_timeout: Duration,
}

impl MqttConfig {
    /// Default keep-alive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Default time to wait for the broker's CONNACK.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration subscribing to `topic` on `broker`.
    ///
    /// `broker` accepts `mqtt://`, `tcp://`, `mqtts://`, `ssl://` or a bare
    /// `host[:port]`.
    #[must_use]
    pub fn new(broker: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            topic: topic.into(),
            username: None,
            password: None,
            client_id: None,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets username and password.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a username without a password.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = None;
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = duration;
        self
    }

    /// Sets how long [`MqttSubscriber::connect`] waits for the broker.
    #[must_use]
    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Returns the broker URL.
    #[must_use]
    pub fn broker(&self) -> &str {
        &self.broker
    }

    /// Returns the topic filter.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn into_options(self) -> Result<(MqttOptions, String, Duration), ProtocolError> {
        let address = BrokerAddress::parse(&self.broker)?;

        // PID + counter to avoid clashing with another client on the same account
        let client_id = self.client_id.unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("homeprobe_{}_{}", std::process::id(), counter)
        });

        let mut options = MqttOptions::new(&client_id, address.host, address.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);

        if address.tls {
            options.set_transport(Transport::tls_with_default_config());
        }
        if let Some(username) = self.username {
            options.set_credentials(username, self.password.unwrap_or_default());
        }

        Ok((options, self.topic, self.connect_timeout))
    }
}

/// Host, port and transport parsed from a broker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Whether the connection uses TLS.
    pub tls: bool,
}

impl BrokerAddress {
    /// Parses `mqtt://`, `tcp://`, `mqtts://`, `ssl://` or bare addresses.
    ///
    /// Without a port, 1883 is used for plain connections and 8883 for TLS.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] for an empty host or a
    /// non-numeric port.
    pub fn parse(url: &str) -> Result<Self, ProtocolError> {
        let (rest, tls) = if let Some(rest) = url.strip_prefix("mqtts://") {
            (rest, true)
        } else if let Some(rest) = url.strip_prefix("ssl://") {
            (rest, true)
        } else if let Some(rest) = url.strip_prefix("mqtt://") {
            (rest, false)
        } else {
            (url.strip_prefix("tcp://").unwrap_or(url), false)
        };
        let rest = rest.trim_end_matches('/');

        let (host, port) = if let Some((h, p)) = rest.rsplit_once(':') {
            let port = p
                .parse()
                .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
            (h, port)
        } else {
            (rest, if tls { 8883 } else { 1883 })
        };

        if host.is_empty() {
            return Err(ProtocolError::InvalidAddress(format!("Missing host in {url}")));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

// ============================================================================
// MqttSubscriber
// ============================================================================

/// A message received on the subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Returns the payload as text, replacing invalid UTF-8.
    #[must_use]
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Decodes the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the payload does not match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_slice(&self.payload).map_err(Into::into)
    }
}

/// Receives publishes on one topic filter.
///
/// The connection is not re-established after a failure; once the broker
/// goes away [`next_message`](Self::next_message) returns `None`.
///
/// # Examples
///
/// ```no_run
/// use homeprobe::protocol::{MqttConfig, MqttSubscriber};
///
/// # async fn example() -> Result<(), homeprobe::error::ProtocolError> {
/// let config = MqttConfig::new("mqtt://127.0.0.1:1883", "yl-home/1234/+/report");
/// let mut subscriber = MqttSubscriber::connect(config).await?;
///
/// while let Some(message) = subscriber.next_message().await {
///     println!("{}: {}", message.topic, message.payload_text());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MqttSubscriber {
    client: AsyncClient,
    topic: String,
    messages: mpsc::Receiver<MqttMessage>,
    event_task: JoinHandle<()>,
}

impl MqttSubscriber {
    /// Connects to the broker, subscribes and waits for the CONNACK.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] for a malformed broker URL,
    /// [`ProtocolError::Timeout`] if the broker does not answer in time,
    /// [`ProtocolError::AuthenticationFailed`] if credentials are rejected,
    /// and [`ProtocolError::ConnectionFailed`] for other failures.
    pub async fn connect(config: MqttConfig) -> Result<Self, ProtocolError> {
        let broker = config.broker.clone();
        let (options, topic, connect_timeout) = config.into_options()?;

        let (client, event_loop) = AsyncClient::new(options, 10);
        let (message_tx, messages) = mpsc::channel::<MqttMessage>(64);
        let (connected_tx, connected_rx) = oneshot::channel();

        client
            .subscribe(&topic, QoS::AtMostOnce)
            .await
            .map_err(ProtocolError::Mqtt)?;

        let filter = topic.clone();
        let event_task = tokio::spawn(async move {
            handle_mqtt_events(event_loop, filter, message_tx, connected_tx).await;
        });

        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = connect_timeout.as_millis() as u64;

        let outcome = tokio::time::timeout(connect_timeout, connected_rx).await;
        match outcome {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                event_task.abort();
                return Err(e);
            }
            Ok(Err(_)) => {
                event_task.abort();
                return Err(ProtocolError::ChannelClosed(
                    "MQTT event loop ended before connecting".to_string(),
                ));
            }
            Err(_) => {
                event_task.abort();
                return Err(ProtocolError::Timeout(timeout_ms));
            }
        }

        tracing::info!(broker = %broker, topic = %topic, "MQTT subscribed");

        Ok(Self {
            client,
            topic,
            messages,
            event_task,
        })
    }

    /// Returns the subscribed topic filter.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next message; `None` once the connection has ended.
    pub async fn next_message(&mut self) -> Option<MqttMessage> {
        self.messages.recv().await
    }

    /// Sends DISCONNECT to the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.client.disconnect().await.map_err(ProtocolError::Mqtt)
    }
}

impl Drop for MqttSubscriber {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

/// Drives the event loop, reporting the connection outcome once.
async fn handle_mqtt_events(
    mut event_loop: EventLoop,
    filter: String,
    message_tx: mpsc::Sender<MqttMessage>,
    connected_tx: oneshot::Sender<Result<(), ProtocolError>>,
) {
    use rumqttc::{Event, Packet};

    let mut connected_tx = Some(connected_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
                let result = match connack.code {
                    ConnectReturnCode::Success => Ok(()),
                    ConnectReturnCode::BadUserNamePassword | ConnectReturnCode::NotAuthorized => {
                        Err(ProtocolError::AuthenticationFailed)
                    }
                    code => Err(ProtocolError::ConnectionFailed(format!(
                        "Broker refused connection: {code:?}"
                    ))),
                };
                let refused = result.is_err();
                if let Some(tx) = connected_tx.take() {
                    let _ = tx.send(result);
                }
                if refused {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if !topic_matches(&filter, &publish.topic) {
                    tracing::debug!(topic = %publish.topic, "Ignoring message outside subscription");
                    continue;
                }
                tracing::debug!(
                    topic = %publish.topic,
                    bytes = publish.payload.len(),
                    "Received MQTT message"
                );
                let message = MqttMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if message_tx.send(message).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                match connected_tx.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(ProtocolError::ConnectionFailed(e.to_string())));
                    }
                    None => tracing::error!(error = %e, "MQTT event loop error"),
                }
                break;
            }
        }
    }
}

/// Returns `true` if `topic` matches the subscription `filter`.
///
/// Supports the single-level `+` and multi-level `#` wildcards.
///
/// # Examples
///
/// ```
/// use homeprobe::protocol::topic_matches;
///
/// assert!(topic_matches("yl-home/1/+/report", "yl-home/1/abc/report"));
/// assert!(topic_matches("GA/#", "GA/key/extra"));
/// assert!(!topic_matches("yl-home/1/+/report", "yl-home/1/abc/response"));
/// ```
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

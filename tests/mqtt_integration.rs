// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT subscriber using mockforge-mqtt.

use std::time::Duration;

use homeprobe::protocol::{self, MqttSubscriber};
use homeprobe::{ProtocolError, govee, yolink};
use mockforge_mqtt::broker::MqttConfig as BrokerConfig;
use mockforge_mqtt::start_mqtt_server;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::time::{sleep, timeout};

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = BrokerConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind
    sleep(Duration::from_millis(500)).await;
}

// ============================================================================
// Connection
// ============================================================================

mod subscriber_connection {
    use super::*;

    #[tokio::test]
    async fn connect_and_subscribe() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let config = protocol::MqttConfig::new(format!("mqtt://127.0.0.1:{port}"), "yl-home/h1/+/report");
        let result = MqttSubscriber::connect(config).await;

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
        let subscriber = result.unwrap();
        assert_eq!(subscriber.topic(), "yl-home/h1/+/report");
        subscriber.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn connect_without_scheme_with_credentials() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let config = protocol::MqttConfig::new(format!("127.0.0.1:{port}"), "GA/key")
            .with_credentials("key", "key")
            .with_client_id("homeprobe_test_client");
        let result = MqttSubscriber::connect(config).await;

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
    }

    #[tokio::test]
    async fn receives_published_report() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let config = protocol::MqttConfig::new(format!("mqtt://127.0.0.1:{port}"), "yl-home/h1/+/report");
        let mut subscriber = MqttSubscriber::connect(config).await.unwrap();

        let mut options = MqttOptions::new("homeprobe_test_publisher", "127.0.0.1", port);
        options.set_keep_alive(Duration::from_secs(30));
        let (publisher, mut eventloop) = AsyncClient::new(options, 10);
        tokio::spawn(async move { while eventloop.poll().await.is_ok() {} });
        // Let the subscription and the publisher connection settle
        sleep(Duration::from_millis(300)).await;

        publisher
            .publish("yl-home/h1/dev-1/report", QoS::AtMostOnce, false, r#"{"x":1}"#)
            .await
            .unwrap();

        let message = timeout(Duration::from_secs(5), subscriber.next_message())
            .await
            .expect("no message within 5s")
            .expect("stream ended");
        assert_eq!(message.topic, "yl-home/h1/dev-1/report");
        assert_eq!(message.payload_text(), r#"{"x":1}"#);

        subscriber.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_fails_fast() {
        // Nothing listens on this port
        let port = get_test_port();

        let config = protocol::MqttConfig::new(format!("mqtt://127.0.0.1:{port}"), "t/#")
            .with_connect_timeout(Duration::from_secs(3));
        let err = MqttSubscriber::connect(config).await.unwrap_err();

        assert!(matches!(err, ProtocolError::ConnectionFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invalid_broker_url_is_rejected() {
        let config = protocol::MqttConfig::new("mqtt://:1883", "t");
        let err = MqttSubscriber::connect(config).await.unwrap_err();

        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }
}

// ============================================================================
// Vendor configurations
// ============================================================================

mod vendor_config {
    use super::*;

    #[test]
    fn yolink_subscribes_to_home_reports() {
        let config = yolink::mqtt_config("access", "home-9");
        assert_eq!(config.broker(), "mqtt://mqtt.api.yosmart.com:8003");
        assert_eq!(config.topic(), "yl-home/home-9/+/report");
    }

    #[test]
    fn govee_subscribes_to_account_topic_over_tls() {
        let config = govee::mqtt_config("api-key");
        assert_eq!(config.topic(), "GA/api-key");

        let address = protocol::BrokerAddress::parse(config.broker()).unwrap();
        assert_eq!(address.host, "mqtt.openapi.govee.com");
        assert_eq!(address.port, 8883);
        assert!(address.tls);
    }

    #[tokio::test]
    async fn yolink_config_connects_to_local_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let topic = yolink::report_topic("home-9");
        let config = protocol::MqttConfig::new(format!("mqtt://127.0.0.1:{port}"), topic)
            .with_username("access-token");
        let subscriber = MqttSubscriber::connect(config).await.unwrap();

        assert!(protocol::topic_matches(subscriber.topic(), "yl-home/home-9/dev-1/report"));
        assert!(!protocol::topic_matches(subscriber.topic(), "yl-home/other/dev-1/report"));
    }
}

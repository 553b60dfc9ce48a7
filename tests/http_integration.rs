// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the vendor HTTP clients using wiremock.

use homeprobe::govee::{self, DeviceCategory, GoveeClient};
use homeprobe::hue::{self, HueClient, TokenExchange};
use homeprobe::protocol::HttpConfig;
use homeprobe::state::{ChangeDetector, DeviceKey, Liveness};
use homeprobe::yolink::YoLinkClient;
use homeprobe::{DeviceEvent, Error, ProtocolError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// YoLink
// ============================================================================

mod yolink_client {
    use super::*;

    fn client(server: &MockServer) -> YoLinkClient {
        YoLinkClient::with_config(HttpConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn request_token_sends_client_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/open/yolink/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=uaid-1"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-123",
                "token_type": "bearer",
                "expires_in": 7200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client(&server).request_token("uaid-1", "s3cret").await.unwrap();
        assert_eq!(token, "tok-123");
    }

    #[tokio::test]
    async fn request_token_surfaces_oauth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/open/yolink/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "invalid_client",
                "error_description": "Bad UAID"
            })))
            .mount(&server)
            .await;

        let err = client(&server).request_token("x", "y").await.unwrap_err();
        match err {
            Error::Api(api) => {
                assert_eq!(api.code, "invalid_client");
                assert_eq!(api.message, "Bad UAID");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn home_info_posts_bddp_with_bearer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/open/yolink/v2/api"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({"method": "Home.getGeneralInfo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "000000",
                "desc": "Success",
                "data": {"id": "home-42"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = client(&server).with_token("tok").home_info().await.unwrap();
        assert_eq!(info.id, "home-42");
    }

    #[tokio::test]
    async fn devices_returns_list() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/open/yolink/v2/api"))
            .and(body_partial_json(json!({"method": "Home.getDeviceList"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "000000",
                "data": {"devices": [
                    {"deviceId": "d1", "name": "Front Door", "type": "DoorSensor", "token": "t1"},
                    {"deviceId": "d2", "name": "Hub", "type": "Hub"}
                ]}
            })))
            .mount(&server)
            .await;

        let devices = client(&server).with_token("tok").devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert!(devices[0].is_door_sensor());
        assert!(!devices[1].is_door_sensor());
        assert_eq!(devices[0].token.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn non_success_code_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/open/yolink/v2/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "010104",
                "desc": "Token is expired"
            })))
            .mount(&server)
            .await;

        let err = client(&server).with_token("old").home_info().await.unwrap_err();
        match err {
            Error::Api(api) => {
                assert_eq!(api.vendor, "YoLink");
                assert_eq!(api.code, "010104");
                assert_eq!(api.message, "Token is expired");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}

// ============================================================================
// Govee
// ============================================================================

mod govee_client {
    use super::*;

    fn client(server: &MockServer) -> GoveeClient {
        GoveeClient::with_config(HttpConfig::new(server.uri()), "key-1").unwrap()
    }

    #[tokio::test]
    async fn devices_sends_api_key_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/router/api/v1/user/devices"))
            .and(header("Govee-API-Key", "key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "success",
                "data": [
                    {
                        "sku": "H6008",
                        "device": "AA:BB",
                        "deviceName": "Desk Lamp",
                        "type": "devices.types.light",
                        "capabilities": [{"type": "devices.capabilities.on_off", "instance": "powerSwitch"}]
                    },
                    {
                        "sku": "H5179",
                        "device": "CC:DD",
                        "deviceName": "Fridge Sensor",
                        "type": "devices.types.sensor",
                        "capabilities": [{"type": "devices.capabilities.event", "instance": "lackWaterEvent"}]
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let devices = client(&server).devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].category(), DeviceCategory::Light);
        assert_eq!(govee::device_key(&devices[0]).as_str(), "Desk Lamp (H6008)");
        assert!(devices[1].supports_events());
    }

    #[tokio::test]
    async fn device_state_posts_request_id_and_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/router/api/v1/device/state"))
            .and(body_partial_json(json!({"payload": {"sku": "H6008", "device": "AA:BB"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "requestId": "r",
                "code": 200,
                "msg": "success",
                "payload": {
                    "sku": "H6008",
                    "device": "AA:BB",
                    "capabilities": [
                        {"type": "devices.capabilities.on_off", "instance": "powerSwitch", "state": {"value": 1}},
                        {"type": "devices.capabilities.range", "instance": "brightness", "state": {"value": 80}}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let state = client(&server).device_state("H6008", "AA:BB").await.unwrap();
        let snapshot = govee::snapshot_of(&state);
        assert_eq!(snapshot.get("brightness"), Some(&json!({"value": 80})));
        assert_eq!(govee::liveness_of(&state), Liveness::Online);
    }

    #[tokio::test]
    async fn error_code_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/router/api/v1/device/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 400,
                "msg": "devices not exist"
            })))
            .mount(&server)
            .await;

        let err = client(&server).device_state("H6008", "gone").await.unwrap_err();
        assert!(matches!(err, Error::Api(ref api) if api.code == "400" && api.message == "devices not exist"));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/router/api/v1/user/devices"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server).devices().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::RateLimited)));
    }

    #[tokio::test]
    async fn failed_poll_takes_light_offline() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/router/api/v1/device/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "payload": {"capabilities": [
                    {"type": "devices.capabilities.on_off", "instance": "powerSwitch", "state": {"value": 1}}
                ]}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/router/api/v1/device/state"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = client(&server);
        let key = DeviceKey::new("Desk Lamp (H6008)");
        let mut detector = ChangeDetector::new();

        let (snapshot, liveness) = govee::observe(&key, client.device_state("H6008", "AA:BB").await);
        let events = DeviceEvent::from_poll(&mut detector, &key, snapshot, liveness);
        assert!(matches!(events.as_slice(), [DeviceEvent::BaselineCaptured { .. }]));

        let result = client.device_state("H6008", "AA:BB").await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::ConnectionFailed(ref msg))) if msg == "HTTP 500 - upstream down"
        ));
        let (snapshot, liveness) = govee::observe(&key, result);
        let events = DeviceEvent::from_poll(&mut detector, &key, snapshot, liveness);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change().map(|c| c.field()), Some("connectivity"));
    }
}

// ============================================================================
// Philips Hue
// ============================================================================

mod hue_client {
    use super::*;

    fn client(server: &MockServer) -> HueClient {
        HueClient::with_config(HttpConfig::new(server.uri()), "hue-token").unwrap()
    }

    #[tokio::test]
    async fn lights_are_keyed_by_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/route/api/0/lights"))
            .and(header("authorization", "Bearer hue-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "1": {"name": "Desk", "type": "Extended color light", "modelid": "LCT015",
                      "state": {"on": true, "bri": 200, "reachable": true}},
                "2": {"name": "Porch", "type": "Dimmable light",
                      "state": {"on": false, "bri": 1, "reachable": false}}
            })))
            .mount(&server)
            .await;

        let lights = client(&server).lights().await.unwrap();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights["1"].brightness(), Some(200));
        assert!(!lights["2"].reachable());

        let mut detector = ChangeDetector::new();
        let events = hue::observe_lights(&mut detector, &lights);
        assert_eq!(events.len(), 2);
        assert!(detector.is_tracking(&hue::device_key("1", "Desk")));
    }

    #[tokio::test]
    async fn lights_and_sensors_fetch_both() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/route/api/0/lights"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "1": {"name": "Desk", "state": {"on": true}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/route/api/0/sensors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "7": {"name": "Hall motion", "type": "ZLLPresence",
                      "state": {"presence": true, "lastupdated": "2026-01-05T10:00:00"},
                      "config": {"reachable": true, "battery": 88}},
                "8": {"name": "Daylight", "type": "Daylight", "state": {"daylight": true}}
            })))
            .mount(&server)
            .await;

        let (lights, sensors) = client(&server).lights_and_sensors().await.unwrap();
        assert_eq!(lights.len(), 1);
        assert!(sensors["7"].is_relevant());
        assert!(!sensors["8"].is_relevant());
        assert_eq!(sensors["7"].presence(), Some(true));
    }

    #[tokio::test]
    async fn expired_token_is_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/route/api/0/lights"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).lights().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::AuthenticationFailed)));

        let mut detector = ChangeDetector::new();
        assert!(hue::observe_failure(&mut detector).is_empty());
    }

    #[tokio::test]
    async fn resources_pair_sensors_with_owner() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/route/clip/v2/resource"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [],
                "data": [
                    {"id": "dev-1", "type": "device", "metadata": {"name": "Hall sensor"}},
                    {"id": "m-1", "type": "motion", "owner": {"rid": "dev-1", "rtype": "device"},
                     "motion": {"motion": false}},
                    {"id": "l-1", "type": "light", "owner": {"rid": "dev-1", "rtype": "device"}}
                ]
            })))
            .mount(&server)
            .await;

        let resources = client(&server).resources().await.unwrap();
        let sensors = resources.sensors();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].0.id, "m-1");
        assert_eq!(sensors[0].1, Some("Hall sensor"));
        assert_eq!(sensors[0].0.motion_detected(), Some(false));
    }

    #[tokio::test]
    async fn token_exchange_sends_pkce_verifier() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(hue::TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("code_verifier=verifier-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "token_type": "bearer",
                "expires_in": 604_800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let http = HttpConfig::new(server.uri()).into_client().unwrap();
        let exchange = TokenExchange {
            code: "abc",
            verifier: "verifier-1",
            client_id: "client",
            client_secret: "secret",
            redirect_uri: hue::DEFAULT_REDIRECT_URI,
        };
        let tokens = hue::exchange_code(&http, &exchange).await.unwrap();
        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(tokens.expires_in, Some(604_800));
    }

    #[tokio::test]
    async fn token_exchange_reports_oauth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(hue::TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "code expired"
            })))
            .mount(&server)
            .await;

        let http = HttpConfig::new(server.uri()).into_client().unwrap();
        let exchange = TokenExchange {
            code: "stale",
            verifier: "v",
            client_id: "c",
            client_secret: "s",
            redirect_uri: hue::DEFAULT_REDIRECT_URI,
        };
        let err = hue::exchange_code(&http, &exchange).await.unwrap_err();
        assert!(matches!(err, Error::Api(ref api) if api.vendor == "Hue" && api.code == "invalid_grant"));
    }
}

// ============================================================================
// Status mapping
// ============================================================================

mod status {
    use super::*;

    #[tokio::test]
    async fn server_error_includes_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = homeprobe::protocol::check_status(response).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionFailed(ref msg) if msg == "HTTP 503 - maintenance"));
    }

    #[tokio::test]
    async fn empty_body_falls_back_to_reason() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = homeprobe::protocol::check_status(response).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionFailed(ref msg) if msg == "HTTP 404 - Not Found"));
    }

    #[tokio::test]
    async fn success_passes_through() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let response = homeprobe::protocol::check_status(response).await.unwrap();
        assert_eq!(response.status().as_u16(), 204);
    }
}

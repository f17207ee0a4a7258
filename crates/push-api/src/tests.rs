use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn subscription() -> Subscription {
    Subscription {
        endpoint: "https://fcm.googleapis.com/fcm/send/renewed".into(),
        expiration_time: None,
        keys: BTreeMap::from([
            ("p256dh".to_string(), "BPk".to_string()),
            ("auth".to_string(), "tBH".to_string()),
        ]),
    }
}

#[tokio::test]
async fn subscribe_posts_json_with_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/api/push-subscribe/"))
        .and(header("content-type", "application/json"))
        .and(header("cookie", "sessionid=abc123"))
        .and(body_json(json!({
            "endpoint": "https://fcm.googleapis.com/fcm/send/renewed",
            "expirationTime": null,
            "keys": {"p256dh": "BPk", "auth": "tBH"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = PushApiClient::new(&server.uri())
        .expect("client")
        .with_session_cookie("sessionid=abc123");
    client.subscribe(&subscription()).await.expect("subscribe");
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/api/push-subscribe/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Missing subscription keys"))
        .mount(&server)
        .await;

    let client = PushApiClient::new(&server.uri()).expect("client");
    let err = client.subscribe(&subscription()).await.expect_err("400");
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Missing subscription keys");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn any_2xx_is_success_without_reading_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = PushApiClient::new(&server.uri()).expect("client");
    assert!(client.subscribe(&subscription()).await.is_ok());
}

#[tokio::test]
async fn registry_maps_failures_to_submit_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = PushApiClient::new(&server.uri()).expect("client");
    let err = client.register(&subscription()).await.expect_err("500");
    assert!(matches!(err, PlatformError::Submit(_)));
}

#[tokio::test]
async fn custom_subscribe_path_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/push/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = PushApiClient::new(&server.uri())
        .expect("client")
        .with_subscribe_path("/api/v2/push/");
    client.subscribe(&subscription()).await.expect("subscribe");
}

#[tokio::test]
async fn unsubscribe_posts_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/api/push-unsubscribe/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = PushApiClient::new(&server.uri()).expect("client");
    client
        .unsubscribe("https://fcm.googleapis.com/fcm/send/old")
        .await
        .expect("unsubscribe");

    let requests = server.received_requests().await.expect("recorded");
    assert_eq!(requests.len(), 1);
    let body = requests[0]
        .body_json::<serde_json::Value>()
        .expect("json body");
    assert_eq!(body, json!({"endpoint": "https://fcm.googleapis.com/fcm/send/old"}));
}

#[test]
fn invalid_base_url_is_rejected() {
    assert!(matches!(
        PushApiClient::new("not a url"),
        Err(ApiError::UrlParse(_))
    ));
}

#[test]
fn cookie_with_newline_is_rejected() {
    let client = PushApiClient::new("https://mjolobid.example")
        .expect("client")
        .with_session_cookie("sessionid=a\nb");
    assert!(matches!(client.headers(), Err(ApiError::InvalidCookie)));
}

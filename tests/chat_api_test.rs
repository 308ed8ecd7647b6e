//! Router-level tests for the chat relay

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use mockito::{Matcher, Server};
use serial_test::serial;

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

#[tokio::test]
#[serial]
async fn test_chat_relays_reply() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"contents":[{"parts":[{"text":"Which area is best for families?"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_body(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Try the suburbs."}]}}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let app = TestApp::with_chat(&server.url(), Some("test-key")).await;
    let response = app
        .post_json("/api/chat", r#"{"message":"  Which area is best for families?  "}"#)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["reply"], "Try the suburbs.");
    mock.assert_async().await;
}

#[tokio::test]
#[serial]
async fn test_chat_rejects_blank_message_without_calling_upstream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = TestApp::with_chat(&server.url(), Some("test-key")).await;

    for body in [r#"{"message":""}"#, r#"{"message":"   "}"#, r#"{}"#, "not json"] {
        let response = app.post_json("/api/chat", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        assert!(body_json(response).await["error"].is_string());
    }

    mock.assert_async().await;
}

#[tokio::test]
#[serial]
async fn test_chat_upstream_failure_is_generic_500() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body(r#"{"error":{"message":"overloaded"}}"#)
        .create_async()
        .await;

    let app = TestApp::with_chat(&server.url(), Some("test-key")).await;
    let response = app.post_json("/api/chat", r#"{"message":"hello"}"#).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "An error occurred while contacting the assistant."
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_without_api_key_is_500() {
    let app = TestApp::with_chat("http://127.0.0.1:9", None).await;
    let response = app.post_json("/api/chat", r#"{"message":"hello"}"#).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

//! Integration tests for the Anthropic connector using wiremock
//!
//! These tests mock the Anthropic API to verify the egress connector's HTTP behavior.

use aicore_core::{
    ErrorKind,
    normalized::{Message, RequestOptions, Usage},
    provider::Provider,
};
use aicore_egress::anthropic::{AnthropicConfig, AnthropicConnector};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

fn connector(server: &MockServer) -> AnthropicConnector {
    AnthropicConnector::new(AnthropicConfig::new("sk-ant-test-key").with_base_url(server.uri()))
        .unwrap()
}

#[tokio::test]
async fn test_anthropic_send_with_system() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "model": "claude-sonnet-4-20250514",
            "system": "Be terse",
            "messages": [{"role": "user", "content": "Hi"}],
            "max_tokens": 4096
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"text": "Hello"}],
            "usage": {"input_tokens": 5, "output_tokens": 2},
            "stop_reason": "end_turn",
            "model": "claude-sonnet-4-20250514",
            "id": "msg_1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = connector(&mock_server)
        .send_request(
            &[Message::system("Be terse"), Message::user("Hi")],
            &RequestOptions::new("claude-sonnet-4-20250514"),
        )
        .await
        .unwrap();

    assert_eq!(response.choices.len(), 1);
    assert_eq!(response.content(), "Hello");
    assert_eq!(response.choices[0].finish_reason, "end_turn");
    assert_eq!(
        response.usage,
        Usage {
            prompt_tokens: 5,
            completion_tokens: 2,
            total_tokens: 7
        }
    );
}

#[tokio::test]
async fn test_anthropic_error_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "error",
            "error": {
                "type": "invalid_request_error",
                "message": "max_tokens: must be greater than 0"
            }
        })))
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .send_request(&[Message::user("Hi")], &RequestOptions::new("claude-3-haiku-20240307"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::VendorHttp);
    assert_eq!(err.to_string(), "max_tokens: must be greater than 0");
}

#[tokio::test]
async fn test_anthropic_test_api_key_probe() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_json(json!({
            "model": "claude-sonnet-4-20250514",
            "messages": [{"role": "user", "content": "Hello"}],
            "max_tokens": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Hi"}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(connector(&mock_server).test_api_key().await);
}

#[tokio::test]
async fn test_anthropic_transport_error() {
    // Nothing listens on the discard port
    let connector = AnthropicConnector::new(
        AnthropicConfig::new("sk-ant-test-key").with_base_url("http://127.0.0.1:9"),
    )
    .unwrap();

    let err = connector
        .send_request(&[Message::user("Hi")], &RequestOptions::new("claude-3-haiku-20240307"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}

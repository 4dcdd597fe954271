//! Integration test: facade → Anthropic adapter → normalised response
//!
//! A chat request for a Claude model is resolved through the registry,
//! translated to the Messages API, normalised, and recorded in usage stats.

use aicore_core::normalized::{Message, RequestOptions};
use aicore_integration_tests::{file_backed_core, mock_endpoints};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "claude-sonnet-4-20250514";

#[tokio::test]
async fn test_claude_request_is_normalised_and_tracked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-REDACTED"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "system": "Be terse",
            "messages": [{ "role": "user", "content": "Hi" }],
            "max_tokens": 2000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "text": "Hello" }],
            "usage": { "input_tokens": 5, "output_tokens": 2 },
            "stop_reason": "end_turn",
            "model": MODEL,
            "id": "msg_1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let core = file_backed_core(dir.path(), mock_endpoints(&mock_server.uri()))
        .await
        .unwrap();
    core.set_api_key("anthropic", "sk-ant-REDACTED")
        .await
        .unwrap();

    let messages = [Message::system("Be terse"), Message::user("Hi")];
    let response = core
        .send_text_request(
            MODEL,
            &messages,
            RequestOptions::new(MODEL),
            Some("article-smasher"),
        )
        .await
        .unwrap();

    assert_eq!(response.choices.len(), 1);
    assert_eq!(response.choices[0].message.content, "Hello");
    assert_eq!(response.choices[0].finish_reason, "end_turn");
    assert_eq!(response.usage.prompt_tokens, 5);
    assert_eq!(response.usage.completion_tokens, 2);
    assert_eq!(response.usage.total_tokens, 7);
    assert_eq!(response.id.as_deref(), Some("msg_1"));
    assert_eq!(aicore_routing::AiCore::extract_content(&response), "Hello");

    let stats = core.get_stats().await.unwrap();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.total_tokens, 7);
    assert_eq!(stats.by_provider["anthropic"].requests, 1);
    assert_eq!(stats.by_model[MODEL].tokens, 7);
    assert_eq!(stats.by_app["article-smasher"].requests, 1);

    // 5 input tokens at 0.003/1k plus 2 output tokens at 0.015/1k
    assert!((stats.total_cost - 0.000045).abs() < 1e-12);
}

#[tokio::test]
async fn test_vendor_error_surfaces_unchanged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": { "type": "authentication_error", "message": "invalid x-api-key" }
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let core = file_backed_core(dir.path(), mock_endpoints(&mock_server.uri()))
        .await
        .unwrap();
    core.set_api_key("anthropic", "sk-ant-api03-revoked-key")
        .await
        .unwrap();

    let err = core
        .send_text_request(
            MODEL,
            &[Message::user("Hi")],
            RequestOptions::new(MODEL),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), aicore_core::ErrorKind::VendorHttp);
    assert_eq!(err.to_string(), "invalid x-api-key");

    // Failed requests are not counted
    assert!(core.get_stats().await.unwrap().is_empty());
}

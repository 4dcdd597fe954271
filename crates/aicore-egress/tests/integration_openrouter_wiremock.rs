//! Integration tests for the OpenRouter connector using wiremock

use aicore_core::{
    ErrorKind,
    normalized::{Message, RequestOptions},
    provider::Provider,
};
use aicore_egress::openrouter::{OpenRouterConfig, OpenRouterConnector};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

#[tokio::test]
async fn test_openrouter_attribution_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-or-v1-test"))
        .and(header("HTTP-Referer", "https://example.test"))
        .and(header("X-Title", "SmashingApps"))
        .and(body_partial_json(json!({
            "model": "mistralai/mixtral-8x7b",
            "temperature": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "model": "mistralai/mixtral-8x7b",
            "choices": [{
                "message": {"role": "assistant", "content": "Bonjour"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = OpenRouterConnector::new(
        OpenRouterConfig::new("sk-or-v1-test")
            .with_base_url(mock_server.uri())
            .with_app_url("https://example.test"),
    )
    .unwrap();

    let response = connector
        .send_request(
            &[Message::user("Hello in French")],
            &RequestOptions::new("mistralai/mixtral-8x7b").with_temperature(0.5),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), "Bonjour");
    assert_eq!(response.usage.total_tokens, 4);
}

#[tokio::test]
async fn test_openrouter_available_models_sorted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "openai/gpt-4o", "name": "GPT-4o"},
                {"id": "anthropic/claude-3.5-sonnet", "name": "Claude 3.5 Sonnet"},
                {"id": "google/gemini-pro", "name": "Gemini Pro"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let connector =
        OpenRouterConnector::new(OpenRouterConfig::new("sk-or-v1-test").with_base_url(mock_server.uri()))
            .unwrap();

    assert_eq!(
        connector.available_models().await,
        vec!["anthropic/claude-3.5-sonnet", "google/gemini-pro", "openai/gpt-4o"]
    );
}

fn connector(server: &MockServer) -> OpenRouterConnector {
    OpenRouterConnector::new(OpenRouterConfig::new("sk-or-v1-test").with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn test_openrouter_error_in_success_body() {
    let mock_server = MockServer::start().await;

    // OpenRouter answers some auth failures with a 200
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "No auth credentials found", "code": 401}
        })))
        .mount(&mock_server)
        .await;

    let connector = connector(&mock_server);

    let err = connector
        .send_request(
            &[Message::user("Hello")],
            &RequestOptions::new("openai/gpt-3.5-turbo"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VendorHttp);
    assert_eq!(err.to_string(), "No auth credentials found");

    assert!(!connector.test_api_key().await);
}

#[tokio::test]
async fn test_openrouter_no_usable_choice() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-2",
            "model": "openai/gpt-3.5-turbo",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let connector = connector(&mock_server);

    let err = connector
        .send_request(
            &[Message::user("Hello")],
            &RequestOptions::new("openai/gpt-3.5-turbo"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(
        err.to_string(),
        "Transport error: OpenRouter response contained no usable choice"
    );

    assert!(!connector.test_api_key().await);
}

#[tokio::test]
async fn test_openrouter_error_carries_vendor_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {"message": "Insufficient credits", "code": 402}
        })))
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .send_request(
            &[Message::user("Hello")],
            &RequestOptions::new("anthropic/claude-sonnet-4"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::VendorHttp);
    assert_eq!(err.to_string(), "Insufficient credits");
}

#[tokio::test]
async fn test_openrouter_error_without_body_uses_generic_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .send_request(
            &[Message::user("Hello")],
            &RequestOptions::new("openai/gpt-4o"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::VendorHttp);
    assert_eq!(err.to_string(), "OpenRouter API request failed");
}

#[tokio::test]
async fn test_openrouter_available_models_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let models = connector(&mock_server).available_models().await;
    assert_eq!(models.len(), 7);
    assert_eq!(models[0], "openai/gpt-4o");
    assert!(models.contains(&"anthropic/claude-sonnet-4".to_string()));
    assert_eq!(models.last().map(String::as_str), Some("google/gemini-1.5-pro"));
}

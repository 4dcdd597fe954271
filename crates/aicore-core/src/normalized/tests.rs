//! Tests for normalised types

use super::*;

#[test]
fn test_message_serializes_lowercase_role() {
    let message = Message::system("Be terse");
    let json = serde_json::to_value(&message).unwrap();

    assert_eq!(json["role"], "system");
    assert_eq!(json["content"], "Be terse");

    let back: Message = serde_json::from_value(json).unwrap();
    assert_eq!(back, message);
}

#[test]
fn test_resolved_for_fills_defaults() {
    let options = RequestOptions::default().resolved_for("gpt-4o");

    assert_eq!(options.model, "gpt-4o");
    assert_eq!(options.max_tokens, Some(DEFAULT_MAX_TOKENS));
    assert_eq!(options.temperature, Some(DEFAULT_TEMPERATURE));
}

#[test]
fn test_resolved_for_keeps_explicit_values() {
    let options = RequestOptions::new("ignored")
        .with_max_tokens(50)
        .with_temperature(0.0)
        .with_top_p(0.9)
        .resolved_for("claude-sonnet-4-20250514");

    assert_eq!(options.model, "claude-sonnet-4-20250514");
    assert_eq!(options.max_tokens, Some(50));
    assert_eq!(options.temperature, Some(0.0));
    assert_eq!(options.top_p, Some(0.9));
}

#[test]
fn test_resolved_for_treats_zero_max_tokens_as_unset() {
    let options = RequestOptions::new("gpt-4o")
        .with_max_tokens(0)
        .resolved_for("gpt-4o");

    assert_eq!(options.max_tokens, Some(DEFAULT_MAX_TOKENS));
}

#[test]
fn test_usage_total_is_sum() {
    let usage = Usage::new(5, 2);
    assert_eq!(usage.total_tokens, 7);

    let saturated = Usage::new(u32::MAX, 1);
    assert_eq!(saturated.total_tokens, u32::MAX);
}

#[test]
fn test_response_serializes_camel_case() {
    let response = NormalisedResponse {
        choices: vec![Choice {
            message: Message::assistant("Hello"),
            finish_reason: "stop".to_string(),
            index: 0,
        }],
        usage: Usage::new(1, 1),
        model: "gpt-4o".to_string(),
        object: "chat.completion".to_string(),
        created: None,
        id: Some("chatcmpl-1".to_string()),
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["choices"][0]["finishReason"], "stop");
    assert_eq!(json["usage"]["totalTokens"], 2);
    assert!(json.get("created").is_none());
    assert_eq!(response.content(), "Hello");
    assert!(!response.is_error());
}

#[test]
fn test_reasoning_hints_serialize() {
    let options = RequestOptions::new("gpt-5")
        .with_reasoning_effort(Effort::High)
        .with_verbosity(Effort::Low);

    let json = serde_json::to_value(&options).unwrap();
    assert_eq!(json["reasoning"]["effort"], "high");
    assert_eq!(json["text"]["verbosity"], "low");
}

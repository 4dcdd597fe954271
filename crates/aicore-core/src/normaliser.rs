//! Response normaliser
//!
//! Pure functions mapping each vendor's decoded JSON body onto
//! [`NormalisedResponse`]. The normalisers never fail: a body that does not
//! decode becomes a placeholder built by [`create_error_response`].
//!
//! `usage.total_tokens` is always recomputed as prompt + completion, even when
//! the vendor reports its own total.

use crate::normalized::{Choice, Message, NormalisedResponse, Role, Usage};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

const CHAT_COMPLETION: &str = "chat.completion";

const INCOMPLETE_PLACEHOLDER: &str = "[Response incomplete: The model generated reasoning but did not produce final output. Please increase max_output_tokens or simplify the request.]";

// OpenAI wire types (chat completions and responses share one lenient shape)

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAIBody {
    id: Option<String>,
    object: Option<String>,
    created: Option<i64>,
    created_at: Option<i64>,
    model: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
    status: Option<String>,
    output: Option<Vec<Value>>,
    output_text: Option<Value>,
    incomplete_details: Option<IncompleteDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAIChoice {
    #[serde(deserialize_with = "null_as_default")]
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAIMessage {
    role: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAIUsage {
    #[serde(deserialize_with = "null_as_default")]
    prompt_tokens: u32,
    #[serde(deserialize_with = "null_as_default")]
    completion_tokens: u32,
    #[serde(deserialize_with = "null_as_default")]
    input_tokens: u32,
    #[serde(deserialize_with = "null_as_default")]
    output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IncompleteDetails {
    reason: Option<String>,
}

// Anthropic wire types

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnthropicBody {
    id: Option<String>,
    model: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    content: Vec<AnthropicBlock>,
    stop_reason: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    usage: AnthropicUsage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnthropicBlock {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnthropicUsage {
    #[serde(deserialize_with = "null_as_default")]
    input_tokens: u32,
    #[serde(deserialize_with = "null_as_default")]
    output_tokens: u32,
}

// Gemini wire types

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiBody {
    #[serde(deserialize_with = "null_as_default")]
    candidates: Vec<GeminiCandidate>,
    #[serde(deserialize_with = "null_as_default")]
    usage_metadata: GeminiUsage,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiContent {
    #[serde(deserialize_with = "null_as_default")]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(deserialize_with = "null_as_default")]
    prompt_token_count: u32,
    #[serde(deserialize_with = "null_as_default")]
    candidates_token_count: u32,
}

// Vendors send `null` for counts and lists they have nothing to report for
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn decode<'a, T: Deserialize<'a>>(vendor: &str, raw: &'a Value) -> Option<T> {
    match T::deserialize(raw) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(vendor, "Failed to decode response body: {}", e);
            None
        }
    }
}

fn raw_model(raw: &Value) -> &str {
    raw.get("model").and_then(Value::as_str).unwrap_or("unknown")
}

fn single_choice(content: String, finish_reason: String) -> Vec<Choice> {
    vec![Choice {
        message: Message::new(Role::Assistant, content),
        finish_reason,
        index: 0,
    }]
}

fn parse_role(role: Option<&str>) -> Role {
    match role {
        Some("system") => Role::System,
        Some("user") => Role::User,
        _ => Role::Assistant,
    }
}

/// Normalise an OpenAI body, either `/v1/chat/completions` or `/v1/responses`
pub fn normalise_openai(raw: &Value) -> NormalisedResponse {
    let Some(body) = decode::<OpenAIBody>("openai", raw) else {
        return create_error_response("Malformed OpenAI response", raw_model(raw));
    };

    let is_responses_format = body.object.as_deref() == Some("response")
        || matches!(body.status.as_deref(), Some("completed" | "incomplete"));

    if is_responses_format {
        return normalise_openai_responses(body);
    }

    if body.choices.is_empty() {
        return create_error_response(
            "OpenAI response contained no choices",
            body.model.as_deref().unwrap_or("unknown"),
        );
    }

    let choices = body
        .choices
        .into_iter()
        .enumerate()
        .map(|(index, choice)| Choice {
            message: Message::new(
                parse_role(choice.message.role.as_deref()),
                choice.message.content.unwrap_or_default(),
            ),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            index: index as u32,
        })
        .collect();

    let usage = body.usage.unwrap_or_default();

    NormalisedResponse {
        choices,
        usage: Usage::new(usage.prompt_tokens, usage.completion_tokens),
        model: body.model.unwrap_or_default(),
        object: body.object.unwrap_or_else(|| CHAT_COMPLETION.to_string()),
        created: body.created,
        id: body.id,
    }
}

fn normalise_openai_responses(body: OpenAIBody) -> NormalisedResponse {
    let output = body.output.unwrap_or_default();
    let mut content = String::new();

    if let Some(node) = output
        .iter()
        .find(|o| o.get("type").and_then(Value::as_str) == Some("message"))
        && let Some(parts) = node.get("content")
    {
        content = flatten_content(parts);
    }

    if content.is_empty()
        && let Some(node) = output.iter().find(|o| {
            matches!(
                o.get("type").and_then(Value::as_str),
                Some("text" | "output_text")
            )
        })
    {
        content = flatten_content(node.get("text").or_else(|| node.get("content")).unwrap_or(&Value::Null));
    }

    if content.is_empty()
        && let Some(output_text) = &body.output_text
    {
        content = flatten_content(output_text);
    }

    if content.is_empty()
        && let Some(summary) = output
            .iter()
            .find(|o| o.get("type").and_then(Value::as_str) == Some("reasoning"))
            .and_then(|node| node.get("summary"))
    {
        content = match summary {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => flatten_content(other),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        };
    }

    let status = body.status.as_deref();
    debug!(
        status = ?status,
        output_nodes = output.len(),
        content_len = content.len(),
        "Normalised Responses API body"
    );

    if content.is_empty() {
        match status {
            Some("incomplete") => {
                warn!("Responses API body incomplete with reasoning only; consider raising max_output_tokens");
                content = INCOMPLETE_PLACEHOLDER.to_string();
            }
            Some("completed") => warn!("Responses API body completed but no text was extracted"),
            _ => {}
        }
    }

    let finish_reason = if status == Some("completed") {
        "stop".to_string()
    } else {
        body.incomplete_details
            .and_then(|d| d.reason)
            .unwrap_or_else(|| "length".to_string())
    };

    let usage = body.usage.unwrap_or_default();

    NormalisedResponse {
        choices: single_choice(content, finish_reason),
        usage: Usage::new(usage.input_tokens, usage.output_tokens),
        model: body.model.unwrap_or_default(),
        object: CHAT_COMPLETION.to_string(),
        created: body.created_at.or(body.created),
        id: body.id,
    }
}

/// Flatten the nested content structures of the Responses API into text
fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                Value::Object(_) => {
                    if let Some(text) = part.get("text").and_then(Value::as_str) {
                        text.to_string()
                    } else if let Some(nested @ Value::Array(_)) = part.get("content") {
                        flatten_content(nested)
                    } else {
                        String::new()
                    }
                }
                _ => String::new(),
            })
            .collect(),
        Value::Object(_) => {
            if let Some(text) = content.get("text").and_then(Value::as_str) {
                text.to_string()
            } else if let Some(nested @ Value::Array(_)) = content.get("content") {
                flatten_content(nested)
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

/// Normalise an Anthropic `/v1/messages` body
pub fn normalise_anthropic(raw: &Value) -> NormalisedResponse {
    let Some(body) = decode::<AnthropicBody>("anthropic", raw) else {
        return create_error_response("Malformed Anthropic response", raw_model(raw));
    };

    let content = body
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .unwrap_or_default();

    NormalisedResponse {
        choices: single_choice(
            content,
            body.stop_reason.unwrap_or_else(|| "stop".to_string()),
        ),
        usage: Usage::new(body.usage.input_tokens, body.usage.output_tokens),
        model: body.model.unwrap_or_default(),
        object: CHAT_COMPLETION.to_string(),
        created: None,
        id: body.id,
    }
}

/// Normalise a Gemini `generateContent` body
pub fn normalise_gemini(raw: &Value) -> NormalisedResponse {
    let Some(body) = decode::<GeminiBody>("gemini", raw) else {
        return create_error_response("Malformed Gemini response", "gemini");
    };

    let candidate = body.candidates.into_iter().next();
    let finish_reason = candidate
        .as_ref()
        .and_then(|c| c.finish_reason.as_deref())
        .filter(|r| !r.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "stop".to_string());
    let content = candidate
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_default();

    NormalisedResponse {
        choices: single_choice(content, finish_reason),
        usage: Usage::new(
            body.usage_metadata.prompt_token_count,
            body.usage_metadata.candidates_token_count,
        ),
        model: body.model_version.unwrap_or_else(|| "gemini".to_string()),
        object: CHAT_COMPLETION.to_string(),
        created: None,
        id: body.response_id,
    }
}

/// OpenRouter speaks the OpenAI wire format
pub fn normalise_openrouter(raw: &Value) -> NormalisedResponse {
    normalise_openai(raw)
}

/// Content of the first choice, or an empty string
pub fn extract_content(response: &NormalisedResponse) -> String {
    response.content().to_string()
}

pub fn extract_usage(response: &NormalisedResponse) -> Usage {
    response.usage
}

/// True when a raw vendor body carries an `error` field
pub fn has_error(raw: &Value) -> bool {
    raw.get("error").is_some_and(|e| !e.is_null())
}

/// Human-readable error from a raw vendor body, empty when there is none
pub fn extract_error(raw: &Value) -> String {
    match raw.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => String::new(),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Placeholder response for callers that prefer a normalised-shaped failure
pub fn create_error_response(message: &str, model: &str) -> NormalisedResponse {
    debug!(model, "Creating error response: {}", message);
    NormalisedResponse {
        choices: single_choice(String::new(), "error".to_string()),
        usage: Usage::default(),
        model: model.to_string(),
        object: "error".to_string(),
        created: None,
        id: None,
    }
}

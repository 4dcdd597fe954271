//! Normalised request and response types

use serde::{Deserialize, Serialize};

/// Default completion budget applied by the facade when a caller sets none
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default sampling temperature applied by the facade when a caller sets none
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Text content of the message
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Effort level for reasoning-capable model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// Reasoning controls (GPT-5 and o-series models)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<Effort>,
}

/// Output text controls (GPT-5 family)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Effort>,
}

/// Request-shaping parameters, built per call and never persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// Model identifier
    pub model: String,

    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold
    pub top_p: Option<f32>,

    pub frequency_penalty: Option<f32>,

    pub presence_penalty: Option<f32>,

    /// Stop sequences
    #[serde(default)]
    pub stop: Vec<String>,

    /// Reasoning effort hint for newer model families
    pub reasoning: Option<ReasoningOptions>,

    /// Text verbosity hint for newer model families
    pub text: Option<TextOptions>,
}

impl RequestOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_reasoning_effort(mut self, effort: Effort) -> Self {
        self.reasoning = Some(ReasoningOptions {
            effort: Some(effort),
        });
        self
    }

    pub fn with_verbosity(mut self, verbosity: Effort) -> Self {
        self.text = Some(TextOptions {
            verbosity: Some(verbosity),
        });
        self
    }

    /// Bind the options to `model` and fill the facade defaults.
    ///
    /// A zero `max_tokens` counts as unset.
    pub fn resolved_for(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self.max_tokens = match self.max_tokens {
            Some(n) if n > 0 => Some(n),
            _ => Some(DEFAULT_MAX_TOKENS),
        };
        self.temperature = Some(self.temperature.unwrap_or(DEFAULT_TEMPERATURE));
        self
    }
}

/// Canonical response shape returned to every caller regardless of vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalisedResponse {
    /// Response choices; never empty on success
    pub choices: Vec<Choice>,

    /// Token usage information
    pub usage: Usage,

    /// Model that generated the response
    pub model: String,

    /// Object type, `chat.completion` on success and `error` for placeholders
    pub object: String,

    /// Creation timestamp as reported by the vendor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Vendor response id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl NormalisedResponse {
    /// Content of the first choice, or an empty string
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default()
    }

    pub fn is_error(&self) -> bool {
        self.object == "error"
    }
}

/// A single choice in a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// The message content
    pub message: Message,

    /// Reason why generation stopped, verbatim from the vendor where it
    /// reports one
    pub finish_reason: String,

    /// Index of this choice
    pub index: u32,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Build usage whose total is always the sum of its parts
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

#[cfg(test)]
mod tests;

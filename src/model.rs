const ALTERNATE_TOKEN_FIELD_PREFIXES: &[&str] = &["gpt-4", "gpt-4.1", "gpt-5"];
const NO_TEMPERATURE_PREFIXES: &[&str] = &["gpt-4.1", "gpt-5"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request field that carries the completion length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimitField {
    MaxTokens,
    MaxCompletionTokens,
}

impl TokenLimitField {
    pub fn for_model(model: &str) -> Self {
        if has_any_prefix(model, ALTERNATE_TOKEN_FIELD_PREFIXES) {
            Self::MaxCompletionTokens
        } else {
            Self::MaxTokens
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxTokens => "max_tokens",
            Self::MaxCompletionTokens => "max_completion_tokens",
        }
    }
}

/// Model families that reject a `temperature` field.
pub fn supports_temperature(model: &str) -> bool {
    !has_any_prefix(model, NO_TEMPERATURE_PREFIXES)
}

fn has_any_prefix(model: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| model.starts_with(prefix))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub token_limit: u32,
    pub token_limit_field: TokenLimitField,
    pub temperature: Option<f32>,
    /// Provider-side completion count (`n`); `None` means one.
    pub completions: Option<u32>,
}

impl ChatRequest {
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt.clone()),
            Message::user(self.user_prompt.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatResponse {
    pub choices: Vec<String>,
}

impl ChatResponse {
    #[cfg(test)]
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            choices: vec![text.into()],
        }
    }

    pub fn first_text(&self) -> &str {
        self.choices.first().map(String::as_str).unwrap_or_default()
    }
}

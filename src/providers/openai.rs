use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{ChatRequest, ChatResponse, TokenLimitField};
use crate::providers::http_errors::model_api_request_error;

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn chat_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn to_wire_request(request: &ChatRequest) -> OpenAiChatRequest {
    let (max_tokens, max_completion_tokens) = match request.token_limit_field {
        TokenLimitField::MaxTokens => (Some(request.token_limit), None),
        TokenLimitField::MaxCompletionTokens => (None, Some(request.token_limit)),
    };

    OpenAiChatRequest {
        model: request.model.clone(),
        messages: request
            .messages()
            .into_iter()
            .map(|msg| ChatMessage {
                role: msg.role.as_str(),
                content: msg.content,
            })
            .collect(),
        max_tokens,
        max_completion_tokens,
        temperature: request.temperature,
        n: request.completions.filter(|count| *count > 1),
    }
}

fn from_wire_response(parsed: OpenAiChatResponse) -> ChatResponse {
    ChatResponse {
        choices: parsed
            .choices
            .into_iter()
            .map(|choice| choice.message.content.unwrap_or_default())
            .collect(),
    }
}

pub async fn chat(client: &Client, cfg: &Config, request: &ChatRequest) -> Result<ChatResponse> {
    let api_key = cfg
        .api_key
        .as_deref()
        .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set. Export it or add it to a .env file."))?;
    let api_url = chat_url(&cfg.model_base_url);
    let body = to_wire_request(request);
    debug!(
        api_url = %api_url,
        model = %request.model,
        token_field = request.token_limit_field.as_str(),
        token_limit = request.token_limit,
        temperature = ?request.temperature,
        completions = ?request.completions,
        "sending chat completion request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %request.model,
                error = %err,
                "chat completion request failed"
            );
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %request.model,
            status = %status,
            response_body_len = response_body.len(),
            "chat completion returned non-success status"
        );
        return Err(anyhow!(
            "Model request failed with status {}: {}",
            status,
            response_body
        ));
    }

    let parsed: OpenAiChatResponse = response
        .json()
        .await
        .context("Failed to parse chat completion response")?;
    let parsed = from_wire_response(parsed);
    debug!(
        model = %request.model,
        choice_count = parsed.choices.len(),
        first_len = parsed.first_text().len(),
        "received chat completion response"
    );
    Ok(parsed)
}

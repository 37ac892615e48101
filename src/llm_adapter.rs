use std::time::Duration;

use serde_json::{json, Value};

use crate::runtime_config::{self, RuntimeFlags};

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub text: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

/// Seam between the pipeline and the hosted chat model. The pipeline only
/// ever sends one system/user prompt pair and reads back plain text.
pub trait ChatModel {
    fn generate(&self, request: &ChatRequest) -> Result<ChatResponse, String>;
}

pub struct OpenAiChatModel {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiChatModel {
    pub fn from_flags(flags: &RuntimeFlags) -> Result<Self, String> {
        Ok(Self {
            api_key: runtime_config::required_api_key()?,
            model: flags.chat_model.clone(),
            timeout: Duration::from_secs(flags.request_timeout_secs),
        })
    }
}

impl ChatModel for OpenAiChatModel {
    fn generate(&self, request: &ChatRequest) -> Result<ChatResponse, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|error| format!("Failed to build chat HTTP client: {error}"))?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt.trim() },
                { "role": "user", "content": request.user_prompt.trim() }
            ],
            "temperature": 0.2
        });
        let response = client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|error| format!("Failed to call chat API: {error}"))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .map_err(|error| format!("Invalid chat response payload: {error}"))?;
        if !status.is_success() {
            return Err(format!("Chat API failed with status {status}: {payload}"));
        }

        parse_chat_payload(&payload)
    }
}

fn parse_chat_payload(payload: &Value) -> Result<ChatResponse, String> {
    let text = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("Chat response did not include assistant content: {payload}"))?
        .to_string();

    let input_tokens = payload
        .get("usage")
        .and_then(|usage| usage.get("prompt_tokens"))
        .and_then(Value::as_u64)
        .map(|value| value as u32);
    let output_tokens = payload
        .get("usage")
        .and_then(|usage| usage.get("completion_tokens"))
        .and_then(Value::as_u64)
        .map(|value| value as u32);

    Ok(ChatResponse {
        text,
        input_tokens,
        output_tokens,
    })
}

use log::{error, warn};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::llm_decode::decode_structured;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured")]
    NoApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("malformed JSON from model: {0}")]
    MalformedJson(String),
}

impl LlmError {
    /// Failures worth another attempt with the next key.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::EmptyResponse => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::NoApiKey | LlmError::MalformedJson(_) => false,
        }
    }
}

/// Round-robin API keys. The caller owns it and hands it to every request.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: Vec<String>,
    next: usize,
}

impl KeyRing {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys
            .into_iter()
            .map(Into::into)
            .map(|k: String| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys, next: 0 }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key for the next request; advances the ring.
    pub fn next_key(&mut self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self.next % self.keys.len();
        self.next = (index + 1) % self.keys.len();
        Some(&self.keys[index])
    }
}

/// Something that turns a prompt into model text.
pub trait CompletionService {
    fn complete_text(
        &self,
        keys: &mut KeyRing,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, LlmError>;

    /// Like `complete_text`, but asks for JSON matching `schema`.
    fn complete_json(
        &self,
        keys: &mut KeyRing,
        prompt: &str,
        system: Option<&str>,
        schema: &serde_json::Value,
    ) -> Result<String, LlmError>;
}

/// Runs a JSON completion and decodes it into `T`.
pub fn structured<T: DeserializeOwned>(
    service: &dyn CompletionService,
    keys: &mut KeyRing,
    prompt: &str,
    system: Option<&str>,
    schema: &serde_json::Value,
) -> Result<T, LlmError> {
    let raw = service.complete_json(keys, prompt, system, schema)?;
    decode_structured(&raw)
}

/* =========================
   OpenAI-compatible client
   ========================= */

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for a `/v1/chat/completions` endpoint (LM Studio, OpenAI, ...).
pub struct ChatCompletionsClient {
    http: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    require_api_key: bool,
}

impl ChatCompletionsClient {
    pub const MIN_ATTEMPTS: usize = 3;

    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            require_api_key: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Hosted endpoints need a bearer key; local servers usually don't.
    pub fn requiring_api_key(mut self, require: bool) -> Self {
        self.require_api_key = require;
        self
    }

    pub fn test_connection(&self) -> Result<String, LlmError> {
        let resp: serde_json::Value = self
            .http
            .get(format!("{}/models", self.base_url))
            .send()
            .map_err(|e| LlmError::Network(e.to_string()))?
            .json()
            .map_err(|e| LlmError::MalformedJson(e.to_string()))?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map_or(0, |a| a.len())
        ))
    }

    fn send(
        &self,
        keys: &mut KeyRing,
        prompt: &str,
        system: Option<&str>,
        response_format: Option<serde_json::Value>,
    ) -> Result<String, LlmError> {
        if self.require_api_key && keys.is_empty() {
            return Err(LlmError::NoApiKey);
        }

        let attempts = keys.len().max(Self::MIN_ATTEMPTS);
        let mut last_error = LlmError::EmptyResponse;

        for attempt in 1..=attempts {
            let key = keys.next_key().map(str::to_string);
            match self.send_once(key.as_deref(), prompt, system, response_format.clone()) {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() => {
                    warn!("Completion attempt {attempt}/{attempts} failed: {err}");
                    last_error = err;
                }
                Err(err) => {
                    error!("Completion request failed: {err}");
                    return Err(err);
                }
            }
        }

        error!("Completion request failed after {attempts} attempts: {last_error}");
        Err(last_error)
    }

    fn send_once(
        &self,
        key: Option<&str>,
        prompt: &str,
        system: Option<&str>,
        response_format: Option<serde_json::Value>,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format,
        };

        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&req);
        if let Some(key) = key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = resp
            .json()
            .map_err(|e| LlmError::MalformedJson(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

impl CompletionService for ChatCompletionsClient {
    fn complete_text(
        &self,
        keys: &mut KeyRing,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, LlmError> {
        self.send(keys, prompt, system, None)
    }

    fn complete_json(
        &self,
        keys: &mut KeyRing,
        prompt: &str,
        system: Option<&str>,
        schema: &serde_json::Value,
    ) -> Result<String, LlmError> {
        let response_format = serde_json::json!({
            "type": "json_schema",
            "json_schema": { "name": "response", "schema": schema },
        });
        self.send(keys, prompt, system, Some(response_format))
    }
}

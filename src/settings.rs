use serde::{Deserialize, Serialize};

use crate::engine::llm_client::{ChatCompletionsClient, KeyRing};

/// Comma-separated keys that replace the configured key ring.
pub const API_KEYS_ENV: &str = "AI_RPG_API_KEYS";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_keys: Vec<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,

    // Hosted endpoints reject requests without a key
    pub require_api_key: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            endpoint: "http://localhost:1234/v1".into(),
            model: "local-model".into(),
            temperature: 0.7,
            max_output_tokens: Some(8000),
            require_api_key: false,
        }
    }
}

impl Settings {
    /// Replaces the key list with `raw` (comma-separated) when it is set.
    pub fn apply_key_override(&mut self, raw: Option<&str>) {
        if let Some(raw) = raw {
            self.api_keys = raw
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
    }

    pub fn key_ring(&self) -> KeyRing {
        KeyRing::new(self.api_keys.iter().cloned())
    }

    pub fn client(&self) -> ChatCompletionsClient {
        ChatCompletionsClient::new(&self.endpoint, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_output_tokens)
            .requiring_api_key(self.require_api_key)
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::clients::traits::{CompletionError, TextCompleter};

/// OpenAI-compatible chat completions endpoint (llama.cpp server, vLLM, LM Studio)
#[derive(Clone, Debug)]
pub struct LocalClient {
    endpoint: String,
    model: String,
    client: Client,
    timeout_ms: u64,
}

impl LocalClient {
    pub fn new(endpoint: &str, model: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        // Ensure endpoint has the correct path if not provided
        let endpoint = if endpoint.ends_with("/v1/chat/completions") {
            endpoint.to_string()
        } else {
            format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            endpoint,
            model: model.to_string(),
            client,
            timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextCompleter for LocalClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": 500,
            "temperature": 0.1
        });

        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    CompletionError::from(e)
                }
            })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, body });
        }

        let response_json: Value = res
            .json()
            .await
            .map_err(|e| CompletionError::ParseError(e.without_url().to_string()))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(CompletionError::ParseError(
                "local model returned empty content".to_string(),
            ));
        }
        Ok(content)
    }

    fn name(&self) -> &str {
        "local"
    }
}

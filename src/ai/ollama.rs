use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Text-generation backend speaking the Ollama `/api/generate` protocol.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            model,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one prompt, get one reply. No streaming, no retries.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        info!("Requesting analysis from {} ({} chars)", self.model, prompt.len());

        let response = self.client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .context("Ollama request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Ollama API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(GenerateRequest {
            model: "gpt-oss:120b-cloud",
            prompt: "hello",
            stream: false,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({ "model": "gpt-oss:120b-cloud", "prompt": "hello", "stream": false })
        );
    }

    #[test]
    fn test_response_body() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"model":"m","created_at":"2026-01-01T00:00:00Z","response":"**RISK LEVEL: Low**","done":true}"#,
        )
        .unwrap();
        assert_eq!(body.response, "**RISK LEVEL: Low**");
    }
}

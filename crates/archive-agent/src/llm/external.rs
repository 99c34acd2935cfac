//! OpenAI-compatible HTTP generation provider.
//!
//! One implementation covers hosted chat-completions APIs and local
//! Ollama-style servers; only the endpoint and auth differ.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{GenerationConfig, GenerationProvider, ProviderInfo};

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const OLLAMA_ENDPOINT: &str = "http://localhost:11434/v1/chat/completions";

pub struct HttpProvider {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl HttpProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let endpoint = endpoint.into();
        let model = model.into();
        tracing::info!(endpoint = %endpoint, model = %model, "creating HTTP generation provider");

        Ok(Self {
            endpoint,
            api_key,
            model,
            client,
        })
    }

    /// Hosted OpenAI-compatible API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new(OPENAI_ENDPOINT, Some(api_key.into()), model)
    }

    /// Local Ollama server speaking the OpenAI-compatible surface.
    pub fn ollama(model: impl Into<String>) -> Result<Self> {
        Self::new(OLLAMA_ENDPOINT, None, model)
    }

    /// Parse a response body as JSON, returning a clear error if the server
    /// returned HTML (e.g. a gateway error page) instead of valid JSON.
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;

        let trimmed = body.trim_start();
        if trimmed.starts_with('<') || trimmed.starts_with("<!") {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!(
                "Endpoint {} returned HTML instead of JSON (HTTP {}) — the service may be down or misconfigured. Response: {}",
                endpoint, status, preview
            ));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!(
                "Failed to parse JSON from {} (HTTP {}): {}. Response body: {}",
                endpoint,
                status,
                e,
                preview
            )
        })
    }
}

#[async_trait]
impl GenerationProvider for HttpProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let request = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "top_p": config.top_p,
            "stream": false
        });

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending generation request"
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow!(
                    "Request to {} timed out — check network connectivity",
                    self.endpoint
                )
            } else if e.is_connect() {
                anyhow!(
                    "Failed to connect to {} — check network/firewall/proxy settings: {}",
                    self.endpoint,
                    e
                )
            } else {
                anyhow!("Request to {} failed: {}", self.endpoint, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            return Err(anyhow!("API error ({}): {}", status, error));
        }

        let result: CompletionResponse =
            Self::parse_json_response(response, &self.endpoint).await?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No choices returned from API"))?;

        Ok(choice.message.content)
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: if self.api_key.is_some() {
                "openai-compatible".to_string()
            } else {
                "local".to_string()
            },
            model: self.model.clone(),
            context_window: 32_768,
        }
    }

    async fn is_ready(&self) -> bool {
        let probe = GenerationConfig {
            max_tokens: 1,
            ..Default::default()
        };
        match self.generate("Hello", &probe).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "provider health check failed");
                false
            }
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_endpoints() {
        let hosted = HttpProvider::openai("key", "gpt-4o-mini").unwrap();
        assert_eq!(hosted.endpoint, OPENAI_ENDPOINT);
        assert!(hosted.api_key.is_some());

        let local = HttpProvider::ollama("mistral").unwrap();
        assert_eq!(local.endpoint, OLLAMA_ENDPOINT);
        assert!(local.api_key.is_none());
        assert_eq!(local.info().name, "local");
    }

    #[test]
    fn completion_response_deserializes() {
        let body = r#"{"choices":[{"message":{"content":"hello there"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello there");
    }
}

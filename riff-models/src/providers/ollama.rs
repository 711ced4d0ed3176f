//! Ollama local model provider.
//!
//! Speaks the Ollama HTTP API: `/api/generate` for completions and
//! `/api/embeddings` for vectors. One provider instance serves both
//! traits, so the engine can run fully local.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, GenerationOutput, GenerationProvider};
use crate::{Error, Result, Usage};

/// Default Ollama API base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Request body for Ollama's `/api/generate` endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

/// Response from Ollama's `/api/generate` endpoint.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Request body for Ollama's `/api/embeddings` endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama's `/api/embeddings` endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Ollama local model provider.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    embedding_model: String,
    embedding_dimension: usize,
}

impl OllamaProvider {
    /// Create a provider against the default URL (localhost:11434).
    pub fn new(embedding_model: impl Into<String>, embedding_dimension: usize) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, embedding_model, embedding_dimension)
    }

    /// Create a provider with a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        embedding_model: impl Into<String>,
        embedding_dimension: usize,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            embedding_model: embedding_model.into(),
            embedding_dimension,
        }
    }

    /// Get the base URL for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map an HTTP status onto the retryable-vs-fatal taxonomy.
    fn classify_status(model: &str, status: reqwest::StatusCode, body: String) -> Error {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Error::RateLimited {
                model: model.to_string(),
            };
        }
        if status.is_server_error() {
            return Error::Unavailable {
                model: model.to_string(),
                reason: format!("{status}: {body}"),
            };
        }
        Error::InvalidRequest(format!("{model} returned {status}: {body}"))
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<GenerationOutput> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(model, status, body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        Ok(GenerationOutput {
            text: parsed.response,
            usage: Usage::new(
                parsed.prompt_eval_count.unwrap_or(0),
                parsed.eval_count.unwrap_or(0),
            ),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(&self.embedding_model, status, body));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        Ok(parsed.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_url() {
        let provider = OllamaProvider::new("nomic-embed-text", 768);
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(provider.dimension(), 768);
    }

    #[test]
    fn with_base_url_overrides() {
        let provider =
            OllamaProvider::with_base_url("http://10.0.0.5:11434", "nomic-embed-text", 768);
        assert_eq!(provider.base_url(), "http://10.0.0.5:11434");
    }

    #[test]
    fn parse_generate_response_extracts_text_and_usage() {
        let json = r#"{
            "model": "llama3.1:8b",
            "created_at": "2025-01-15T10:00:00Z",
            "response": "Three variants of the hook.",
            "done": true,
            "prompt_eval_count": 42,
            "eval_count": 17
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response, "Three variants of the hook.");
        assert_eq!(parsed.prompt_eval_count, Some(42));
        assert_eq!(parsed.eval_count, Some(17));
    }

    #[test]
    fn parse_generate_response_tolerates_missing_counts() {
        let json = r#"{"response": "text", "done": true}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.prompt_eval_count, None);
    }

    #[test]
    fn parse_embeddings_response_extracts_vector() {
        let json = r#"{"embedding": [0.1, -0.2, 0.3]}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.embedding.len(), 3);
    }

    #[test]
    fn status_429_classifies_as_rate_limited() {
        let err = OllamaProvider::classify_status(
            "llama3.1:8b",
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            String::new(),
        );
        assert!(matches!(err, Error::RateLimited { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn status_5xx_classifies_as_unavailable() {
        let err = OllamaProvider::classify_status(
            "llama3.1:8b",
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "loading".to_string(),
        );
        assert!(matches!(err, Error::Unavailable { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn status_4xx_classifies_as_invalid_request() {
        let err = OllamaProvider::classify_status(
            "llama3.1:8b",
            reqwest::StatusCode::BAD_REQUEST,
            "unknown model".to_string(),
        );
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    /// Check if Ollama is available at the given URL.
    async fn ollama_available(base_url: &str) -> bool {
        let client = reqwest::Client::new();
        client
            .get(format!("{base_url}/api/tags"))
            .timeout(std::time::Duration::from_secs(2))
            .send()
            .await
            .is_ok()
    }

    #[tokio::test]
    #[ignore = "requires Ollama running locally with a model installed"]
    async fn integration_generate_returns_text() {
        let base_url =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());
        if !ollama_available(&base_url).await {
            eprintln!("Skipping: Ollama not available at {base_url}");
            return;
        }

        let provider = OllamaProvider::with_base_url(&base_url, "nomic-embed-text", 768);
        let out = provider
            .generate("llama3.2:3b", "Say 'hello' and nothing else.", 16)
            .await
            .expect("generate should succeed");
        assert!(!out.text.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires Ollama running locally with an embedding model installed"]
    async fn integration_embed_is_deterministic() {
        let base_url =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());
        if !ollama_available(&base_url).await {
            eprintln!("Skipping: Ollama not available at {base_url}");
            return;
        }

        let provider = OllamaProvider::with_base_url(&base_url, "nomic-embed-text", 768);
        let a = provider.embed("the same text").await.expect("embed");
        let b = provider.embed("the same text").await.expect("embed");
        assert_eq!(a, b, "embeddings must be deterministic for identical input");
    }
}

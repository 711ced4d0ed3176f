//! Provider traits for generation and embedding backends.
//!
//! Both traits describe a single shared, stateless, thread-safe client
//! constructed once at process start and passed explicitly (`Arc`) to the
//! components that need it. Nothing in the engine reaches for an ambient
//! global provider.

mod ollama;

use async_trait::async_trait;

pub use ollama::OllamaProvider;

use crate::{Result, Usage};

/// Raw output of a single generation call, before routing metadata is
/// attached.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub text: String,
    pub usage: Usage,
}

/// A text generation backend.
///
/// Implementations must distinguish retryable failures (rate limits,
/// transient unavailability, timeouts) from fatal ones (malformed input,
/// policy rejection) via [`crate::Error::is_retryable`].
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name, used as the prefix of qualified model ids.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt` with the given model.
    async fn generate(&self, model: &str, prompt: &str, max_tokens: u32)
        -> Result<GenerationOutput>;
}

/// A text embedding backend.
///
/// Embeddings must be deterministic for identical input: retrieval and
/// diversity checks both rely on stable vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Fixed dimensionality of the vectors this provider produces.
    fn dimension(&self) -> usize;

    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts.
    ///
    /// The default implementation embeds sequentially; providers with a
    /// batch endpoint should override to cut latency.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// A mock provider for testing the traits.
    struct MockBackend;

    #[async_trait]
    impl GenerationProvider for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(
            &self,
            model: &str,
            prompt: &str,
            _max_tokens: u32,
        ) -> Result<GenerationOutput> {
            if prompt.is_empty() {
                return Err(Error::InvalidRequest("empty prompt".into()));
            }
            Ok(GenerationOutput {
                text: format!("[{model}] echo: {prompt}"),
                usage: Usage::new(prompt.len() as u64, 8),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockBackend {
        fn dimension(&self) -> usize {
            4
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let len = text.len() as f32;
            Ok(vec![len, len / 2.0, 1.0, 0.0])
        }
    }

    #[test]
    fn traits_are_object_safe() {
        fn _generation(_: Box<dyn GenerationProvider>) {}
        fn _embedding(_: Box<dyn EmbeddingProvider>) {}
    }

    #[tokio::test]
    async fn mock_generate_returns_output() {
        let backend = MockBackend;
        let out = backend.generate("m1", "hello", 64).await.unwrap();
        assert_eq!(out.text, "[m1] echo: hello");
        assert_eq!(out.usage.input_tokens, 5);
    }

    #[tokio::test]
    async fn mock_generate_rejects_empty_prompt() {
        let backend = MockBackend;
        let err = backend.generate("m1", "", 64).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn default_embed_batch_preserves_order() {
        let backend = MockBackend;
        let texts = vec!["a".to_string(), "abc".to_string()];
        let vectors = backend.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0][0], 1.0);
        assert_eq!(vectors[1][0], 3.0);
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let backend = MockBackend;
        let a = backend.embed("same input").await.unwrap();
        let b = backend.embed("same input").await.unwrap();
        assert_eq!(a, b);
    }
}

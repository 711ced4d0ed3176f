//! riff-models - Backend model access for the riff variant engine
//!
//! Provider abstractions for text generation and embeddings, an Ollama
//! HTTP provider, the complexity-tier model router with fallback chains
//! and bounded backoff, and additive cost accounting.

pub mod error;
pub mod ledger;
pub mod providers;
pub mod router;
mod types;

pub use error::{Error, Result};
pub use ledger::{CallRecord, CostLedger, CostSummary};
pub use providers::{EmbeddingProvider, GenerationOutput, GenerationProvider, OllamaProvider};
pub use router::ModelRouter;
pub use types::{Completion, ModelId, Pricing, Usage};

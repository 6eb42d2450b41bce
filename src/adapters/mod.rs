//! Text-generation backends.
//!
//! A backend turns a [`RhymeRequest`] into raw generated text. The rhyme
//! generator owns retries, cleanup and fallback, so backends only report
//! what happened on a single attempt.

pub mod gemini;
pub mod proxy;

use async_trait::async_trait;

use crate::domain::GenerationOptions;
use crate::error::Result;

pub use gemini::GeminiBackend;
pub use proxy::ProxyBackend;

/// One generation request, with the prompt already built
#[derive(Debug, Clone)]
pub struct RhymeRequest {
    /// Fully rendered prompt (used by direct API backends)
    pub prompt: String,

    /// Extracted page text (used by relay backends that build their own prompt)
    pub content: String,

    pub options: GenerationOptions,
}

/// Trait for text-generation backends
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Run a single generation attempt
    async fn generate(&self, request: &RhymeRequest) -> Result<String>;

    /// Check that the backend is reachable and credentials are accepted
    async fn health_check(&self) -> Result<()>;
}

//! Upstream recommendation sources
//!
//! Two seams live here. [`LlmProvider`] is a raw text-generation call to a
//! hosted model, used by the proxy endpoint. [`RemoteRecommender`] is
//! anything that turns a query into a recommendation payload, used by the
//! gateway before it falls back to local matching.
use serde_json::Value;

use crate::error::AppResult;

pub mod gemini;
pub mod llm;
pub mod proxy;

pub use gemini::GeminiProvider;
pub use llm::LlmRecommender;
pub use proxy::HttpProxyRecommender;

/// Single non-streaming text generation call
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a completion for the full prompt and returns its text
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Source of remote recommendations for the gateway
///
/// Implementations return the payload as parsed JSON. Shape validation is
/// the gateway's job, so a misbehaving remote can never reach callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteRecommender: Send + Sync {
    async fn fetch(&self, query: &str) -> AppResult<Value>;

    /// Recommender name for logging and debugging
    fn name(&self) -> &'static str;
}

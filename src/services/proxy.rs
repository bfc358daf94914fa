//! Server-side recommendation proxy
//!
//! Validates and rate-limits incoming queries, then forwards them to the
//! LLM provider and returns its JSON verbatim. There is no fallback here;
//! callers that want one go through the gateway.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::RecommendRequest,
    services::{
        prompt::build_user_prompt,
        providers::LlmProvider,
        rate_limit::RateLimiter,
    },
};

/// Longest accepted query, in characters after trimming
pub const MAX_QUERY_CHARS: usize = 500;

/// Name of the credential reported when no provider is configured
const CREDENTIAL_NAME: &str = "GEMINI_API_KEY";

/// Trims a query and checks it is non-empty and at most [`MAX_QUERY_CHARS`]
pub fn validate_query(query: Option<&str>) -> AppResult<&str> {
    let query = query.map(str::trim).unwrap_or_default();
    if query.is_empty() || query.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::InvalidInput("Invalid query".to_string()));
    }
    Ok(query)
}

pub struct RecommendProxy {
    limiter: Arc<dyn RateLimiter>,
    provider: Option<Arc<dyn LlmProvider>>,
    system_prompt: Arc<str>,
}

impl RecommendProxy {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        provider: Option<Arc<dyn LlmProvider>>,
        system_prompt: Arc<str>,
    ) -> Self {
        Self {
            limiter,
            provider,
            system_prompt,
        }
    }

    /// Full proxy flow for one request
    ///
    /// The rate limit is checked before the body, so malformed requests
    /// still count against the client's window.
    pub async fn handle(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
        request: AppResult<RecommendRequest>,
    ) -> AppResult<Value> {
        self.admit(client_id, now).await?;
        let request = request?;
        let query = validate_query(request.query.as_deref())?;
        self.forward(query).await
    }

    /// Applies the per-client rate limit
    ///
    /// Limiter backend failures let the request through.
    pub async fn admit(&self, client_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        match self.limiter.check_and_increment(client_id, now).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(client = %client_id, limiter = self.limiter.name(), "Rate limit exceeded");
                Err(AppError::RateLimited {
                    retry_after_secs: self.limiter.window_secs(),
                })
            }
            Err(e) => {
                tracing::warn!(
                    client = %client_id,
                    limiter = self.limiter.name(),
                    error = %e,
                    "Rate limiter unavailable, allowing request"
                );
                Ok(())
            }
        }
    }

    /// Admission check for an upstream call made on behalf of another endpoint
    ///
    /// Validates before counting, so rejected queries leave the window untouched.
    pub async fn screen<'q>(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
        query: &'q str,
    ) -> AppResult<&'q str> {
        let query = validate_query(Some(query))?;
        self.admit(client_id, now).await?;
        Ok(query)
    }

    /// Sends a validated query upstream and parses the reply as JSON
    pub async fn forward(&self, query: &str) -> AppResult<Value> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AppError::MissingCredential(CREDENTIAL_NAME.to_string()))?;

        let text = provider
            .generate(&build_user_prompt(&self.system_prompt, query))
            .await?;
        let payload: Value = serde_json::from_str(&text)?;

        tracing::info!(
            provider = provider.name(),
            query_chars = query.chars().count(),
            "Proxied recommendation request"
        );

        Ok(payload)
    }
}

use std::sync::Arc;

use serde_json::Value;

use crate::{
    error::AppResult,
    services::{
        prompt::build_user_prompt,
        providers::{LlmProvider, RemoteRecommender},
    },
};

/// Asks the LLM provider directly, without a proxy in between
pub struct LlmRecommender {
    provider: Arc<dyn LlmProvider>,
    system_prompt: Arc<str>,
}

impl LlmRecommender {
    pub fn new(provider: Arc<dyn LlmProvider>, system_prompt: Arc<str>) -> Self {
        Self {
            provider,
            system_prompt,
        }
    }
}

#[async_trait::async_trait]
impl RemoteRecommender for LlmRecommender {
    async fn fetch(&self, query: &str) -> AppResult<Value> {
        let prompt = build_user_prompt(&self.system_prompt, query);
        let text = self.provider.generate(&prompt).await?;
        let payload: Value = serde_json::from_str(&text)?;
        Ok(payload)
    }

    fn name(&self) -> &'static str {
        self.provider.name()
    }
}

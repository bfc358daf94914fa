//! Client for a deployed recommendation proxy (`POST <endpoint>/api/recommend`)
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    services::providers::RemoteRecommender,
};

#[derive(Clone)]
pub struct HttpProxyRecommender {
    http_client: HttpClient,
    endpoint: String,
}

impl HttpProxyRecommender {
    pub fn new(endpoint: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    fn url(&self) -> String {
        format!("{}/api/recommend", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl RemoteRecommender for HttpProxyRecommender {
    async fn fetch(&self, query: &str) -> AppResult<Value> {
        let response = self
            .http_client
            .post(self.url())
            .json(&json!({ "query": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Recommendation proxy returned status {}: {}",
                status, body
            )));
        }

        let payload: Value = response.json().await?;
        Ok(payload)
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}

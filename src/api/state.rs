use std::sync::Arc;

use crate::{
    catalog::Catalog,
    config::Config,
    error::AppResult,
    services::{
        prompt::build_system_prompt,
        providers::{
            GeminiProvider, HttpProxyRecommender, LlmProvider, LlmRecommender, RemoteRecommender,
        },
        rate_limit::{InMemoryRateLimiter, RateLimiter, RedisRateLimiter},
        LocalMatcher, RecommendProxy, RecommendationGateway,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub gateway: Arc<RecommendationGateway>,
    pub proxy: Arc<RecommendProxy>,
    /// Whether client identity may come from forwarding headers
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(
        catalog: Arc<Catalog>,
        gateway: Arc<RecommendationGateway>,
        proxy: Arc<RecommendProxy>,
    ) -> Self {
        Self {
            catalog,
            gateway,
            proxy,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// State with local matching only, an in-memory limiter, and no upstream credential
    pub fn local_only(catalog: Arc<Catalog>) -> Self {
        let gateway = RecommendationGateway::local_only(LocalMatcher::new(catalog.clone()));
        let proxy = RecommendProxy::new(
            Arc::new(InMemoryRateLimiter::default()),
            None,
            Arc::from(build_system_prompt(&catalog)),
        );
        Self::new(catalog, Arc::new(gateway), Arc::new(proxy))
    }

    /// Wires catalog, providers, limiter and gateway from configuration
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let catalog = Arc::new(match &config.catalog_path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin()?,
        });
        tracing::info!(
            projects = catalog.len(),
            categories = catalog.categories().len(),
            "Catalog loaded"
        );

        let system_prompt: Arc<str> = Arc::from(build_system_prompt(&catalog));

        let provider: Option<Arc<dyn LlmProvider>> = match config.gemini_key() {
            Some(key) => Some(Arc::new(GeminiProvider::new(
                key.to_string(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
                config.upstream_timeout(),
            )?)),
            None => {
                tracing::warn!("GEMINI_API_KEY not set; /api/recommend will answer 500");
                None
            }
        };

        let remote: Option<Arc<dyn RemoteRecommender>> = match (&config.recommend_endpoint, &provider) {
            (Some(endpoint), _) => Some(Arc::new(HttpProxyRecommender::new(
                endpoint.clone(),
                config.upstream_timeout(),
            )?)),
            (None, Some(provider)) => Some(Arc::new(LlmRecommender::new(
                provider.clone(),
                system_prompt.clone(),
            ))),
            (None, None) => None,
        };
        match &remote {
            Some(remote) => tracing::info!(remote = remote.name(), "Remote recommendations enabled"),
            None => tracing::info!("No remote recommender configured; using local matching only"),
        }

        let limiter: Arc<dyn RateLimiter> = match &config.redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())?;
                Arc::new(
                    RedisRateLimiter::new(
                        client,
                        config.rate_limit_max_requests,
                        config.rate_limit_window_secs,
                    )
                    .await?,
                )
            }
            None => Arc::new(InMemoryRateLimiter::new(
                config.rate_limit_max_requests,
                config.rate_limit_window_secs,
            )),
        };
        tracing::info!(
            limiter = limiter.name(),
            max_requests = config.rate_limit_max_requests,
            window_secs = config.rate_limit_window_secs,
            "Rate limiter configured"
        );

        let gateway = RecommendationGateway::new(
            LocalMatcher::new(catalog.clone()),
            remote,
            config.upstream_timeout(),
        );
        let proxy = RecommendProxy::new(limiter, provider, system_prompt);

        Ok(Self::new(catalog, Arc::new(gateway), Arc::new(proxy))
            .with_trusted_proxy_headers(config.trust_proxy_headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_without_credentials_is_local_only() {
        let state = AppState::from_config(&Config::default()).await.unwrap();
        assert!(!state.gateway.has_remote());
        assert_eq!(state.catalog.len(), 48);
        assert!(!state.trust_proxy_headers);
    }

    #[tokio::test]
    async fn test_from_config_with_key_enables_remote() {
        let config = Config {
            gemini_api_key: Some("key".to_string()),
            trust_proxy_headers: true,
            ..Config::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert!(state.gateway.has_remote());
        assert!(state.trust_proxy_headers);
    }

    #[tokio::test]
    async fn test_from_config_missing_catalog_file() {
        let config = Config {
            catalog_path: Some("/nonexistent/catalog.json".to_string()),
            ..Config::default()
        };
        assert!(AppState::from_config(&config).await.is_err());
    }
}

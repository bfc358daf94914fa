use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{QueryResult, Recommendation, RemotePayload},
    services::{
        matcher::{LocalMatcher, MAX_RECOMMENDATIONS},
        providers::RemoteRecommender,
        proxy::RecommendProxy,
    },
};

/// Result of one gateway run, tagged with the path that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// The remote recommender answered with a valid payload
    Remote(QueryResult),
    /// Local keyword matching answered, either by configuration or after a remote failure
    Fallback(QueryResult),
}

impl GatewayOutcome {
    pub fn into_result(self) -> QueryResult {
        match self {
            GatewayOutcome::Remote(result) | GatewayOutcome::Fallback(result) => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GatewayOutcome::Fallback(_))
    }
}

/// Chooses between remote recommendations and local keyword matching
///
/// The gateway never fails: every remote problem (transport error, non-2xx,
/// timeout, malformed or empty payload) degrades to the local matcher.
pub struct RecommendationGateway {
    matcher: LocalMatcher,
    remote: Option<Arc<dyn RemoteRecommender>>,
    timeout: Duration,
}

impl RecommendationGateway {
    pub fn new(
        matcher: LocalMatcher,
        remote: Option<Arc<dyn RemoteRecommender>>,
        timeout: Duration,
    ) -> Self {
        Self {
            matcher,
            remote,
            timeout,
        }
    }

    /// Gateway that always answers from the local matcher
    pub fn local_only(matcher: LocalMatcher) -> Self {
        Self::new(matcher, None, Duration::ZERO)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Recommendations for a query; always succeeds
    pub async fn get_recommendations(&self, query: &str) -> QueryResult {
        self.resolve(query).await.into_result()
    }

    pub async fn resolve(&self, query: &str) -> GatewayOutcome {
        let query = query.trim();
        if query.is_empty() {
            return GatewayOutcome::Fallback(QueryResult::local(Vec::new()));
        }

        let Some(remote) = &self.remote else {
            return GatewayOutcome::Fallback(self.local(query));
        };

        match self.try_remote(remote.as_ref(), query).await {
            Ok(recommendations) => {
                tracing::info!(
                    remote = remote.name(),
                    results = recommendations.len(),
                    "Remote recommendations accepted"
                );
                GatewayOutcome::Remote(QueryResult::remote(recommendations))
            }
            Err(e) => {
                tracing::warn!(
                    remote = remote.name(),
                    error = %e,
                    "Remote recommendation failed, falling back to local matching"
                );
                GatewayOutcome::Fallback(self.local(query))
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but the remote attempt must first pass
    /// the proxy's query validation and the client's rate limit
    ///
    /// A rejected query is answered locally and never reaches the remote.
    pub async fn resolve_screened(
        &self,
        proxy: &RecommendProxy,
        client_id: &str,
        now: DateTime<Utc>,
        query: &str,
    ) -> GatewayOutcome {
        if self.remote.is_none() {
            return self.resolve(query).await;
        }

        match proxy.screen(client_id, now, query).await {
            Ok(query) => self.resolve(query).await,
            Err(e) => {
                tracing::info!(
                    client = %client_id,
                    error = %e,
                    "Remote attempt refused, matching locally"
                );
                self.resolve_local(query)
            }
        }
    }

    /// Local keyword matching only; blank queries give an empty result
    pub fn resolve_local(&self, query: &str) -> GatewayOutcome {
        let query = query.trim();
        if query.is_empty() {
            return GatewayOutcome::Fallback(QueryResult::local(Vec::new()));
        }
        GatewayOutcome::Fallback(self.local(query))
    }

    fn local(&self, query: &str) -> QueryResult {
        QueryResult::local(self.matcher.recommend(query))
    }

    async fn try_remote(
        &self,
        remote: &dyn RemoteRecommender,
        query: &str,
    ) -> AppResult<Vec<Recommendation>> {
        let payload = tokio::time::timeout(self.timeout, remote.fetch(query))
            .await
            .map_err(|_| {
                AppError::ExternalApi(format!("remote timed out after {:?}", self.timeout))
            })??;
        self.validate(payload)
    }

    /// Checks a remote payload against the expected schema and the catalog
    ///
    /// Entries naming unknown projects are skipped. A non-empty payload in
    /// which nothing resolves is rejected.
    pub fn validate(&self, payload: Value) -> AppResult<Vec<Recommendation>> {
        let payload: RemotePayload = serde_json::from_value(payload)?;
        let received = payload.recommendations.len();
        let catalog = self.matcher.catalog();

        let mut recommendations: Vec<Recommendation> = payload
            .recommendations
            .into_iter()
            .filter(|entry| catalog.contains(&entry.id))
            .map(|entry| Recommendation {
                match_score: entry.clamped_score(),
                project_id: entry.id,
                title: entry.title,
                reason: entry.reason,
            })
            .collect();

        if received > 0 && recommendations.is_empty() {
            return Err(AppError::ExternalApi(
                "remote recommended no project from the catalog".to_string(),
            ));
        }
        if recommendations.len() < received {
            tracing::debug!(
                skipped = received - recommendations.len(),
                "Skipped remote recommendations with unknown ids"
            );
        }

        recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        recommendations.truncate(MAX_RECOMMENDATIONS);
        Ok(recommendations)
    }
}

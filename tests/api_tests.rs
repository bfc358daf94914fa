use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use portfolio_recommender::{
    api::{create_router, AppState},
    catalog::Catalog,
    error::{AppError, AppResult},
    services::{
        prompt::build_system_prompt,
        providers::{LlmProvider, LlmRecommender, RemoteRecommender},
        rate_limit::InMemoryRateLimiter,
        LocalMatcher, RecommendProxy, RecommendationGateway,
    },
};

/// Provider that always answers with the same text
struct CannedProvider(String);

#[async_trait::async_trait]
impl LlmProvider for CannedProvider {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

/// Provider whose upstream is always down
struct FailingProvider;

#[async_trait::async_trait]
impl LlmProvider for FailingProvider {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        Err(AppError::ExternalApi("upstream returned 503".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Provider that counts upstream calls and answers with one valid pick
#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmProvider for CountingProvider {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "recommendations": [
                { "id": "kanji-quiz", "title": "t", "reason": "r", "matchScore": 80 }
            ]
        })
        .to_string())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin().unwrap())
}

fn create_test_server() -> TestServer {
    let state = AppState::local_only(catalog());
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn server_with_provider(provider: Arc<dyn LlmProvider>, trust_proxy_headers: bool) -> TestServer {
    let catalog = catalog();
    let system_prompt: Arc<str> = Arc::from(build_system_prompt(&catalog));
    let remote: Arc<dyn RemoteRecommender> = Arc::new(LlmRecommender::new(provider.clone(), system_prompt.clone()));
    let gateway = RecommendationGateway::new(
        LocalMatcher::new(catalog.clone()),
        Some(remote),
        Duration::from_secs(5),
    );
    let proxy = RecommendProxy::new(
        Arc::new(InMemoryRateLimiter::default()),
        Some(provider),
        system_prompt,
    );
    let state = AppState::new(catalog, Arc::new(gateway), Arc::new(proxy))
        .with_trusted_proxy_headers(trust_proxy_headers);
    TestServer::new(create_router(state)).unwrap()
}

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc-123"),
        )
        .await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn test_list_projects_and_filter() {
    let server = create_test_server();

    let response = server.get("/api/projects").await;
    response.assert_status_ok();
    let projects: Vec<Value> = response.json();
    assert_eq!(projects.len(), 48);
    assert_eq!(projects[0]["id"], "2ch-video");
    assert_eq!(projects[0]["type"], "python");

    let response = server
        .get("/api/projects")
        .add_query_param("category", "education")
        .await;
    let projects: Vec<Value> = response.json();
    assert_eq!(projects.len(), 4);
    assert!(projects.iter().all(|p| p["category"] == "education"));
}

#[tokio::test]
async fn test_get_project() {
    let server = create_test_server();

    let response = server.get("/api/projects/excel-grade-report").await;
    response.assert_status_ok();
    let project: Value = response.json();
    assert_eq!(project["id"], "excel-grade-report");
    assert_eq!(project["categoryInfo"]["key"], "education");

    let response = server.get("/api/projects/does-not-exist").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_categories() {
    let server = create_test_server();
    let response = server.get("/api/categories").await;
    response.assert_status_ok();
    let categories: Vec<Value> = response.json();
    assert_eq!(categories.len(), 11);
    assert_eq!(categories[0]["key"], "youtube");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = create_test_server();
    let response = server.get("/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn test_match_uses_local_matcher() {
    let server = create_test_server();
    let response = server
        .post("/api/match")
        .json(&json!({ "query": "YouTubeの動画編集を自動化したい" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["source"], "local");
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 5);
    assert_eq!(recs[0]["id"], "2ch-video");
    assert_eq!(recs[0]["matchScore"], 98);
}

#[tokio::test]
async fn test_match_blank_query_is_empty() {
    let server = create_test_server();
    let response = server.post("/api/match").json(&json!({ "query": "   " })).await;
    response.assert_status_ok();
    response.assert_json(&json!({ "source": "local", "recommendations": [] }));
}

#[tokio::test]
async fn test_match_uses_remote_when_valid() {
    let payload = json!({
        "recommendations": [
            { "id": "kanji-quiz", "title": "t", "reason": "クイズ動画に最適", "matchScore": 91 },
            { "id": "ghost-project", "title": "t", "reason": "r", "matchScore": 99 }
        ]
    });
    let server = server_with_provider(Arc::new(CannedProvider(payload.to_string())), false);

    let response = server
        .post("/api/match")
        .json(&json!({ "query": "クイズ動画を作りたい" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["source"], "remote");
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["id"], "kanji-quiz");
    assert_eq!(recs[0]["matchScore"], 91);
}

#[tokio::test]
async fn test_match_falls_back_when_remote_fails() {
    let server = server_with_provider(Arc::new(FailingProvider), false);
    let response = server
        .post("/api/match")
        .json(&json!({ "query": "excel vba で成績表を作りたい" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["source"], "local");
    assert_eq!(body["recommendations"][0]["id"], "excel-grade-report");
}

#[tokio::test]
async fn test_match_remote_attempts_are_rate_limited() {
    let provider = Arc::new(CountingProvider::default());
    let server = server_with_provider(provider.clone(), false);

    for _ in 0..10 {
        let response = server
            .post("/api/match")
            .json(&json!({ "query": "クイズ動画を作りたい" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["source"], "remote");
    }

    let response = server
        .post("/api/match")
        .json(&json!({ "query": "クイズ動画を作りたい" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "local");
    assert!(!body["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(provider.calls(), 10);
}

#[tokio::test]
async fn test_match_oversized_query_never_reaches_provider() {
    let provider = Arc::new(CountingProvider::default());
    let server = server_with_provider(provider.clone(), false);

    for _ in 0..30 {
        let response = server
            .post("/api/match")
            .json(&json!({ "query": "動画".repeat(5_000) }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["source"], "local");
    }
    assert_eq!(provider.calls(), 0);

    // rejected queries did not use up the window
    let response = server
        .post("/api/match")
        .json(&json!({ "query": "クイズ動画を作りたい" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["source"], "remote");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_match_and_recommend_share_the_window() {
    let provider = Arc::new(CountingProvider::default());
    let server = server_with_provider(provider.clone(), false);

    for _ in 0..10 {
        server
            .post("/api/recommend")
            .json(&json!({ "query": "在庫管理" }))
            .await
            .assert_status_ok();
    }

    let response = server
        .post("/api/match")
        .json(&json!({ "query": "クイズ動画を作りたい" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "local");
    assert_eq!(provider.calls(), 10);
}

#[tokio::test]
async fn test_recommend_rejects_invalid_queries() {
    let server = server_with_provider(Arc::new(CannedProvider("{}".to_string())), false);

    for body in [
        json!({ "query": "" }),
        json!({ "query": "   " }),
        json!({}),
        json!({ "query": "あ".repeat(501) }),
    ] {
        let response = server.post("/api/recommend").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Invalid query" }));
    }
}

#[tokio::test]
async fn test_recommend_accepts_max_length_query() {
    let server = server_with_provider(Arc::new(CannedProvider("{\"ok\":true}".to_string())), false);
    let response = server
        .post("/api/recommend")
        .json(&json!({ "query": "あ".repeat(500) }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_recommend_returns_upstream_json_verbatim() {
    let upstream = json!({
        "candidates": [{ "content": { "parts": [{ "text": "{\"recommendations\":[]}" }] } }]
    });
    let server = server_with_provider(Arc::new(CannedProvider(upstream.to_string())), false);

    let response = server
        .post("/api/recommend")
        .json(&json!({ "query": "在庫管理を自動化したい" }))
        .await;
    response.assert_status_ok();
    response.assert_json(&upstream);
}

#[tokio::test]
async fn test_recommend_without_credential() {
    let server = create_test_server();
    let response = server
        .post("/api/recommend")
        .json(&json!({ "query": "在庫管理" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "API key not configured" }));
}

#[tokio::test]
async fn test_recommend_upstream_failure_is_generic() {
    let server = server_with_provider(Arc::new(FailingProvider), false);
    let response = server
        .post("/api/recommend")
        .json(&json!({ "query": "在庫管理" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_recommend_rate_limited_after_ten_requests() {
    let server = server_with_provider(Arc::new(CannedProvider("{}".to_string())), false);

    for _ in 0..10 {
        server
            .post("/api/recommend")
            .json(&json!({ "query": "シフト表" }))
            .await
            .assert_status_ok();
    }

    let response = server
        .post("/api/recommend")
        .json(&json!({ "query": "シフト表" }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    response.assert_json(&json!({ "error": "Rate limit exceeded. Please wait a minute." }));
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
}

#[tokio::test]
async fn test_rate_limit_keys_on_forwarded_client() {
    let server = server_with_provider(Arc::new(CannedProvider("{}".to_string())), true);

    for _ in 0..10 {
        let (name, value) = forwarded_for("198.51.100.1");
        server
            .post("/api/recommend")
            .add_header(name, value)
            .json(&json!({ "query": "メール" }))
            .await
            .assert_status_ok();
    }

    let (name, value) = forwarded_for("198.51.100.1");
    server
        .post("/api/recommend")
        .add_header(name, value)
        .json(&json!({ "query": "メール" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    let (name, value) = forwarded_for("198.51.100.2, 10.0.0.1");
    server
        .post("/api/recommend")
        .add_header(name, value)
        .json(&json!({ "query": "メール" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = create_test_server();
    let response = server
        .get("/api/categories")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://example.com"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

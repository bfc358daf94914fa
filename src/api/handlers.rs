use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::{ClientIp, RequestId},
    models::{Category, Project, QueryResult, RecommendRequest},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ProjectFilter {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: Project,
    #[serde(rename = "categoryInfo")]
    pub category_info: Option<Category>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Proxies a query to the upstream LLM, with validation and rate limiting
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    client: ClientIp,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let request = body.map(|Json(request)| request).map_err(|rejection| {
        tracing::debug!(request_id = %request_id, error = %rejection, "Rejected request body");
        AppError::InvalidInput("Invalid query".to_string())
    });

    let payload = state
        .proxy
        .handle(client.as_str(), Utc::now(), request)
        .await?;

    tracing::info!(request_id = %request_id, client = %client.as_str(), "Recommendation proxied");

    Ok(Json(payload))
}

/// Recommendations with local fallback; never fails
///
/// Remote attempts share the proxy's validation and per-client rate limit.
pub async fn match_projects(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    client: ClientIp,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Json<QueryResult> {
    let query = match body {
        Ok(Json(request)) => request.query.unwrap_or_default(),
        Err(_) => String::new(),
    };

    let outcome = state
        .gateway
        .resolve_screened(&state.proxy, client.as_str(), Utc::now(), &query)
        .await;

    tracing::info!(
        request_id = %request_id,
        fallback = outcome.is_fallback(),
        "Match request completed"
    );

    Json(outcome.into_result())
}

/// Projects in catalog order, optionally filtered by category
pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Json<Vec<Project>> {
    let projects = match filter.category.as_deref() {
        Some(category) if category != "all" => {
            state.catalog.by_category(category).cloned().collect()
        }
        _ => state.catalog.projects().to_vec(),
    };
    Json(projects)
}

/// A single project with its category metadata
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProjectDetailResponse>> {
    let project = state
        .catalog
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", id)))?;

    Ok(Json(ProjectDetailResponse {
        category_info: state.catalog.category(&project.category).cloned(),
        project: project.clone(),
    }))
}

/// Category display metadata
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.catalog.categories().to_vec())
}

/// Fallback for unknown routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

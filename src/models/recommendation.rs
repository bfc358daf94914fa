use serde::{Deserialize, Serialize};

/// Highest match score ever reported
pub const MAX_MATCH_SCORE: u8 = 98;

/// Where a set of recommendations came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Local,
}

/// A single recommended project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Catalog id of the recommended project
    #[serde(rename = "id")]
    pub project_id: String,
    pub title: String,
    pub reason: String,
    /// 0..=98
    pub match_score: u8,
}

/// Recommendations for one query, best first, at most five
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResult {
    pub source: Source,
    pub recommendations: Vec<Recommendation>,
}

impl QueryResult {
    pub fn local(recommendations: Vec<Recommendation>) -> Self {
        Self {
            source: Source::Local,
            recommendations,
        }
    }

    pub fn remote(recommendations: Vec<Recommendation>) -> Self {
        Self {
            source: Source::Remote,
            recommendations,
        }
    }
}

/// Request body for the recommendation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Payload shape the remote recommender must return
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePayload {
    pub recommendations: Vec<RemoteEntry>,
}

/// One entry of a remote payload, before catalog validation
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    pub title: String,
    pub reason: String,
    #[serde(rename = "matchScore")]
    pub match_score: i64,
}

impl RemoteEntry {
    pub fn clamped_score(&self) -> u8 {
        self.match_score.clamp(0, MAX_MATCH_SCORE as i64) as u8
    }
}

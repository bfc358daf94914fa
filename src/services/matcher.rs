use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    catalog::{Catalog, KeywordTables},
    models::{Project, ProjectType, Recommendation, MAX_MATCH_SCORE},
};

/// Maximum number of recommendations returned for one query
pub const MAX_RECOMMENDATIONS: usize = 5;

const CATEGORY_KEYWORD_POINTS: u32 = 10;
const TECH_MATCH_POINTS: u32 = 8;
const TOKEN_MATCH_POINTS: u32 = 5;
const FEATURED_POINTS: u32 = 2;

/// Punctuation that separates query tokens, in addition to whitespace
const TOKEN_SEPARATORS: &[char] = &['、', ',', '。', '.'];

/// A catalog project together with its keyword score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProject<'a> {
    pub project: &'a Project,
    pub score: u32,
}

/// Keyword-based recommender used when the remote recommender is unavailable
///
/// Scoring is a pure function of the query, the catalog and the keyword
/// tables, so a matcher can be shared freely between concurrent requests.
#[derive(Debug, Clone)]
pub struct LocalMatcher {
    catalog: Arc<Catalog>,
    tables: KeywordTables,
}

impl LocalMatcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_tables(catalog, KeywordTables::builtin())
    }

    pub fn with_tables(catalog: Arc<Catalog>, tables: KeywordTables) -> Self {
        Self { catalog, tables }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Top recommendations for a free-text query, best first
    ///
    /// Callers are expected to reject blank queries before calling this.
    pub fn recommend(&self, query: &str) -> Vec<Recommendation> {
        self.score(query)
            .into_iter()
            .take(MAX_RECOMMENDATIONS)
            .map(|scored| Recommendation {
                project_id: scored.project.id.clone(),
                title: scored.project.title.clone(),
                reason: format!(
                    "「{}」が、お探しの内容に近いと思われます。",
                    scored.project.summary
                ),
                match_score: match_score(scored.score),
            })
            .collect()
    }

    /// Every project with a positive score, sorted descending
    ///
    /// Ties keep catalog order.
    pub fn score(&self, query: &str) -> Vec<ScoredProject<'_>> {
        let normalized = query.to_lowercase();
        let category_scores = self.category_scores(&normalized);
        let tech = self.tech_preference(&normalized);
        let tokens = tokenize(&normalized);

        let mut scored: Vec<ScoredProject<'_>> = self
            .catalog
            .projects()
            .iter()
            .map(|project| {
                let mut score = category_scores
                    .get(project.category.as_str())
                    .copied()
                    .unwrap_or(0);

                if tech == Some(project.project_type) {
                    score += TECH_MATCH_POINTS;
                }

                let text = project.search_text();
                let token_hits = tokens.iter().filter(|token| text.contains(*token)).count();
                score += token_hits as u32 * TOKEN_MATCH_POINTS;

                if project.featured {
                    score += FEATURED_POINTS;
                }

                ScoredProject { project, score }
            })
            .filter(|scored| scored.score > 0)
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::debug!(
            candidates = scored.len(),
            tech = tech.map(|t| t.as_str()),
            "Local match scored"
        );

        scored
    }

    /// +10 per keyword of each category contained in the (lowercased) query
    pub fn category_scores(&self, normalized: &str) -> HashMap<&str, u32> {
        self.tables
            .categories
            .iter()
            .map(|(key, keywords)| {
                let hits = keywords
                    .iter()
                    .filter(|keyword| normalized.contains(keyword.as_str()))
                    .count();
                (key.as_str(), hits as u32 * CATEGORY_KEYWORD_POINTS)
            })
            .collect()
    }

    /// First technology in table order with any keyword in the query
    pub fn tech_preference(&self, normalized: &str) -> Option<ProjectType> {
        self.tables
            .technologies
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| normalized.contains(keyword.as_str()))
            })
            .map(|(tech, _)| *tech)
    }
}

/// Splits a normalized query on whitespace and separators, dropping one-character tokens
fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|token| token.chars().count() > 1)
        .collect()
}

/// Converts an internal score to the 0..=98 percentage shown to users
pub fn match_score(score: u32) -> u8 {
    let percent = (f64::from(score) / 20.0 * 100.0).round();
    percent.min(f64::from(MAX_MATCH_SCORE)) as u8
}

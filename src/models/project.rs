use serde::{Deserialize, Serialize};

/// Implementation technology of a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Excel,
    Python,
    Other,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Excel => "excel",
            ProjectType::Python => "python",
            ProjectType::Other => "other",
        }
    }
}

/// A past project advertised in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier, referenced by recommendations
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Category key, e.g. "youtube" or "accounting"
    pub category: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display price such as "¥40,000〜"
    pub estimated_price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_note: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Project {
    /// Lowercased "title summary tags..." text that query tokens are matched against
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.summary, self.tags.join(" ")).to_lowercase()
    }
}

/// Display metadata for a category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub icon: String,
    pub label: String,
    /// Hex color, e.g. "#ef4444"
    pub color: String,
}

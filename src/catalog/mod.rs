//! Static project catalog
//!
//! The catalog is loaded once at startup, either from the JSON document
//! compiled into the binary or from `CATALOG_PATH`, and is read-only afterwards.
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Category, Project},
};

mod keywords;

pub use keywords::KeywordTables;

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Key of the category used for display when a project's key is unknown
pub const FALLBACK_CATEGORY: &str = "other";

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    categories: Vec<Category>,
    projects: Vec<Project>,
}

/// Insertion-ordered projects plus category display metadata
#[derive(Debug, Clone)]
pub struct Catalog {
    projects: Vec<Project>,
    index: HashMap<String, usize>,
    categories: Vec<Category>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate project ids
    pub fn new(categories: Vec<Category>, projects: Vec<Project>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(projects.len());
        for (position, project) in projects.iter().enumerate() {
            if index.insert(project.id.clone(), position).is_some() {
                return Err(AppError::Catalog(format!(
                    "duplicate project id '{}'",
                    project.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.key.as_str()) {
                return Err(AppError::Catalog(format!(
                    "duplicate category key '{}'",
                    category.key
                )));
            }
        }

        Ok(Self {
            projects,
            index,
            categories,
        })
    }

    /// Parses a catalog JSON document
    pub fn from_json(json: &str) -> AppResult<Self> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| AppError::Catalog(format!("invalid catalog document: {}", e)))?;
        Self::new(document.categories, document.projects)
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> AppResult<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads a catalog document from disk
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.index.get(id).map(|&position| &self.projects[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category metadata for a key, falling back to the "other" category
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .or_else(|| self.categories.iter().find(|c| c.key == FALLBACK_CATEGORY))
    }

    pub fn by_category<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Project> + 'a {
        self.projects.iter().filter(move |p| p.category == key)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

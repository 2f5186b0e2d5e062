//! Strategy template library
//!
//! Loaded from a JSON object keyed by template name. File order is kept and
//! doubles as the matcher's tie-break order.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{StrategyTemplate, TemplateComponent};
use crate::core::{StrategyError, StrategyResult};

/// Template body as stored in the library file
#[derive(Debug, Deserialize)]
struct TemplateEntry {
    #[serde(default)]
    components: Vec<TemplateComponent>,
    #[serde(default)]
    tip: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    group: String,
}

/// Ordered collection of strategy templates
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<StrategyTemplate>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<StrategyTemplate>) -> Self {
        Self { templates }
    }

    /// Parse `{ "<name>": { "components": [...], "tip": .., ... }, ... }`
    pub fn from_json_str(json: &str) -> StrategyResult<Self> {
        let root: Map<String, Value> = serde_json::from_str(json)?;
        let mut templates = Vec::with_capacity(root.len());

        for (name, body) in root {
            let entry: TemplateEntry = serde_json::from_value(body).map_err(|e| {
                StrategyError::data(format!("template {:?}: {}", name, e))
            })?;
            templates.push(StrategyTemplate {
                name,
                components: entry.components,
                tip: entry.tip,
                description: entry.description,
                group: entry.group,
            });
        }

        Ok(Self { templates })
    }

    pub fn from_path(path: impl AsRef<Path>) -> StrategyResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let library = Self::from_json_str(&json)?;
        tracing::info!("Loaded {} strategy templates from {}", library.len(), path.display());
        Ok(library)
    }

    pub fn get(&self, name: &str) -> Option<&StrategyTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyTemplate> {
        self.templates.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

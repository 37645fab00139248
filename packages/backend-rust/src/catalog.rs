//! Topic catalog: the canonical set of topics, their section and score weight.
//!
//! Topic identifiers are resolved against the catalog once, at the HTTP
//! boundary; everything past that point handles opaque [`TopicId`]s.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use prep_algo::sanitize::is_valid_number;
use prep_algo::{Section, TopicId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDefinition {
    pub topic_id: TopicId,
    pub name: String,
    pub section: Section,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCatalog {
    topics: Vec<TopicDefinition>,
}

impl TopicCatalog {
    pub fn new(topics: Vec<TopicDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for topic in &topics {
            if topic.topic_id.as_str().trim().is_empty() {
                return Err(CatalogError::Invalid("empty topic id".to_string()));
            }
            if !seen.insert(&topic.topic_id) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate topic id {}",
                    topic.topic_id
                )));
            }
            if !is_valid_number(topic.weight) || topic.weight < 0.0 {
                return Err(CatalogError::Invalid(format!(
                    "topic {} has invalid weight {}",
                    topic.topic_id, topic.weight
                )));
            }
        }
        Ok(Self { topics })
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        struct RawCatalog {
            topics: Vec<TopicDefinition>,
        }

        let parsed: RawCatalog = serde_json::from_str(raw)?;
        Self::new(parsed.topics)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn topics(&self) -> &[TopicDefinition] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn get(&self, topic_id: &TopicId) -> Option<&TopicDefinition> {
        self.topics.iter().find(|t| &t.topic_id == topic_id)
    }

    pub fn contains(&self, topic_id: &TopicId) -> bool {
        self.get(topic_id).is_some()
    }

    pub fn weights(&self) -> HashMap<TopicId, f64> {
        self.topics
            .iter()
            .map(|t| (t.topic_id.clone(), t.weight))
            .collect()
    }

    pub fn sections(&self) -> HashMap<TopicId, Section> {
        self.topics
            .iter()
            .map(|t| (t.topic_id.clone(), t.section))
            .collect()
    }
}

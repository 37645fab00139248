//! Engine error taxonomy
//!
//! Expected empty results (no mastery record yet, no scored topics) are plain
//! `Option`/sentinel values and never surface here.

use serde::Serialize;
use thiserror::Error;

use crate::types::{Difficulty, TopicId};

/// Details of a topic that has nothing left to serve after expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientData {
    pub topic_id: TopicId,
    pub target: Difficulty,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed counters or out-of-range values; nothing was applied
    #[error("validation error: {0}")]
    Validation(String),
    #[error(
        "insufficient questions for topic {} at difficulty {} (pool size {})",
        .0.topic_id, .0.target, .0.pool_size
    )]
    InsufficientData(InsufficientData),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

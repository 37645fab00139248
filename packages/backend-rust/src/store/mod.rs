//! Persistence interface the practice service is driven through.
//!
//! Writes are optimistic: every stored record carries a version, a commit
//! names the version each record was computed from, and any mismatch is
//! reported as [`StoreError::Conflict`] with nothing written. The service owns
//! the re-read/re-apply loop.

mod memory;

pub use memory::InMemoryStore;

use std::collections::HashSet;

use prep_algo::{
    ConceptId, ConceptMasteryRecord, Difficulty, Question, QuestionId, TopicAccuracy, TopicId,
    TopicProgress,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The record changed since it was read; re-read and re-apply
    #[error("write conflict on {key}: expected version {expected:?}, found {actual:?}")]
    Conflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A stored value and the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// A new value and the version it replaces; `None` when inserting
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedWrite<T> {
    pub value: T,
    pub expected_version: Option<u64>,
}

/// Everything one graded attempt writes
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptCommit {
    pub concepts: Vec<VersionedWrite<ConceptMasteryRecord>>,
    pub topic_progress: VersionedWrite<TopicProgress>,
    /// Appended to the recent-attempt log of the progress's topic
    pub question_id: Option<QuestionId>,
}

pub trait PracticeStore: Send + Sync {
    fn load_concept_mastery(
        &self,
        user_id: &str,
        concept_id: &ConceptId,
    ) -> Result<Option<Versioned<ConceptMasteryRecord>>, StoreError>;

    fn list_concept_mastery(&self, user_id: &str) -> Result<Vec<ConceptMasteryRecord>, StoreError>;

    fn load_topic_progress(
        &self,
        user_id: &str,
        topic_id: &TopicId,
    ) -> Result<Option<Versioned<TopicProgress>>, StoreError>;

    /// Ids of the learner's last `limit` answered questions in a topic
    fn load_recent_attempt_ids(
        &self,
        user_id: &str,
        topic_id: &TopicId,
        limit: usize,
    ) -> Result<HashSet<QuestionId>, StoreError>;

    /// Applies every write in `commit` or none of them. A version mismatch
    /// on any record fails the whole commit with [`StoreError::Conflict`].
    fn commit_attempt(&self, user_id: &str, commit: &AttemptCommit) -> Result<(), StoreError>;

    fn load_question_pool(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, StoreError>;

    /// Accuracy summary for a topic; `{accuracy: 50, attempted: 0}` without history
    fn load_topic_accuracy(
        &self,
        user_id: &str,
        topic_id: &TopicId,
    ) -> Result<TopicAccuracy, StoreError> {
        Ok(self
            .load_topic_progress(user_id, topic_id)?
            .map(|stored| stored.value.topic_accuracy())
            .unwrap_or(TopicAccuracy::NEUTRAL))
    }
}

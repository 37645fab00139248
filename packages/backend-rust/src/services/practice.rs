use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use prep_algo::{
    aggregate, assemble_seeded, candidates_from_selections, evaluate, record_result, select,
    AttemptOutcome, ConceptId, ConceptMasteryRecord, Difficulty, EngineError, InsufficientData,
    MasteryLevel, MasterySummary, QuizSpec, ScoreEstimate, Selection, TopicId, TopicProgress,
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::TopicCatalog;
use crate::config::PracticeConfig;
use crate::store::{AttemptCommit, PracticeStore, StoreError, VersionedWrite};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown topic: {0}")]
    UnknownTopic(TopicId),
    #[error("no candidate questions for any requested topic")]
    InsufficientData(Vec<InsufficientData>),
    #[error("write conflict on {key} unresolved after {attempts} attempts")]
    ConcurrencyConflict { key: String, attempts: u32 },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    pub concepts: Vec<ConceptMasteryRecord>,
    pub newly_mastered: Vec<ConceptId>,
    pub topic_progress: TopicProgress,
}

#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub topic_ids: Vec<TopicId>,
    pub requested_count: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSelectionSummary {
    pub topic_id: TopicId,
    pub target_difficulty: Difficulty,
    pub candidates: usize,
    pub expanded: bool,
}

impl From<&Selection> for TopicSelectionSummary {
    fn from(selection: &Selection) -> Self {
        Self {
            topic_id: selection.topic_id.clone(),
            target_difficulty: selection.target,
            candidates: selection.questions.len(),
            expanded: selection.expanded(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPlan {
    #[serde(flatten)]
    pub quiz: QuizSpec,
    /// Seed the shuffle ran with; replaying it reproduces the order
    pub seed: u64,
    pub topics: Vec<TopicSelectionSummary>,
    pub skipped_topics: Vec<InsufficientData>,
}

/// Drives the engine against an injected store.
///
/// Attempts are read-compute-commit cycles against the store; a version
/// conflict triggers a fresh read and a re-run of the pure update, bounded by
/// `max_write_retries`.
pub struct PracticeService {
    store: Arc<dyn PracticeStore>,
    catalog: Arc<TopicCatalog>,
    config: PracticeConfig,
}

impl PracticeService {
    pub fn new(
        store: Arc<dyn PracticeStore>,
        catalog: Arc<TopicCatalog>,
        config: PracticeConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    fn ensure_known_topic(&self, topic_id: &TopicId) -> ServiceResult<()> {
        if self.catalog.contains(topic_id) {
            Ok(())
        } else {
            Err(ServiceError::UnknownTopic(topic_id.clone()))
        }
    }

    /// Reads current state and computes every write one attempt makes
    fn prepare_attempt(
        &self,
        user_id: &str,
        outcome: &AttemptOutcome,
    ) -> ServiceResult<(AttemptCommit, AttemptReport)> {
        let mut writes = Vec::with_capacity(outcome.concept_ids.len());
        let mut newly_mastered = Vec::new();

        for concept_id in &outcome.concept_ids {
            let current = self.store.load_concept_mastery(user_id, concept_id)?;
            let previous_level = current
                .as_ref()
                .map(|stored| stored.value.mastery_level)
                .unwrap_or_default();
            let next = evaluate(current.as_ref().map(|c| &c.value), concept_id, outcome)?;

            if next.mastery_level == MasteryLevel::Mastered
                && previous_level != MasteryLevel::Mastered
            {
                newly_mastered.push(concept_id.clone());
            }
            writes.push(VersionedWrite {
                value: next,
                expected_version: current.map(|stored| stored.version),
            });
        }

        let current = self.store.load_topic_progress(user_id, &outcome.topic_id)?;
        let topic_progress = record_result(
            current.as_ref().map(|stored| &stored.value),
            &outcome.topic_id,
            outcome.correct,
        )?;

        let report = AttemptReport {
            concepts: writes.iter().map(|w| w.value.clone()).collect(),
            newly_mastered,
            topic_progress: topic_progress.clone(),
        };
        let commit = AttemptCommit {
            concepts: writes,
            topic_progress: VersionedWrite {
                value: topic_progress,
                expected_version: current.map(|stored| stored.version),
            },
            question_id: outcome.question_id.clone(),
        };
        Ok((commit, report))
    }

    /// Applies a graded attempt: concept mastery for every tagged concept,
    /// the topic's rolling window and the recent-attempt log, committed
    /// together.
    ///
    /// A version conflict re-reads and recomputes the whole attempt, up to
    /// `max_write_retries` times. A failed attempt writes nothing, so the
    /// caller can safely resubmit it.
    pub fn record_attempt(
        &self,
        user_id: &str,
        outcome: &AttemptOutcome,
    ) -> ServiceResult<AttemptReport> {
        self.ensure_known_topic(&outcome.topic_id)?;
        if outcome.concept_ids.is_empty() {
            return Err(
                EngineError::validation("attempt must be tagged with at least one concept").into(),
            );
        }

        let attempts = self.config.max_write_retries.saturating_add(1);
        let mut last_conflict = None;

        for attempt in 1..=attempts {
            let (commit, report) = self.prepare_attempt(user_id, outcome)?;
            match self.store.commit_attempt(user_id, &commit) {
                Ok(()) => {
                    for concept_id in &report.newly_mastered {
                        tracing::info!(user_id, concept_id = %concept_id, "concept mastered");
                    }
                    tracing::debug!(
                        user_id,
                        topic_id = %outcome.topic_id,
                        correct = outcome.correct,
                        concepts = report.concepts.len(),
                        "attempt recorded"
                    );
                    return Ok(report);
                }
                Err(StoreError::Conflict { key, .. }) => {
                    tracing::warn!(key = %key, attempt, "write conflict, re-reading");
                    last_conflict = Some(key);
                }
                Err(err) => return Err(err.into()),
            }
        }

        let key = last_conflict.unwrap_or_else(|| format!("topic:{user_id}:{}", outcome.topic_id));
        tracing::error!(key = %key, attempts, "write conflict retries exhausted");
        Err(ServiceError::ConcurrencyConflict { key, attempts })
    }

    fn select_for_topic(&self, user_id: &str, topic_id: &TopicId) -> ServiceResult<Selection> {
        let accuracy = self.store.load_topic_accuracy(user_id, topic_id)?;
        let excluded = self.store.load_recent_attempt_ids(
            user_id,
            topic_id,
            self.config.recent_attempt_window,
        )?;

        let mut pool = Vec::new();
        for difficulty in Difficulty::ALL {
            pool.extend(self.store.load_question_pool(topic_id, difficulty)?);
        }

        Ok(select(topic_id, accuracy.accuracy, &pool, &excluded)?)
    }

    /// Builds a practice quiz across `request.topic_ids`.
    ///
    /// Topics without candidates are reported in `skipped_topics`; the call
    /// only fails when every topic comes up empty.
    pub fn build_quiz(&self, user_id: &str, request: &QuizRequest) -> ServiceResult<QuizPlan> {
        if request.topic_ids.is_empty() {
            return Err(EngineError::validation("at least one topic is required").into());
        }
        if request.requested_count == 0 || request.requested_count > self.config.max_quiz_size {
            return Err(EngineError::validation(format!(
                "requested count must be between 1 and {}",
                self.config.max_quiz_size
            ))
            .into());
        }

        let mut seen = HashSet::new();
        let mut selections = Vec::new();
        let mut skipped = Vec::new();

        for topic_id in &request.topic_ids {
            if !seen.insert(topic_id) {
                continue;
            }
            self.ensure_known_topic(topic_id)?;

            match self.select_for_topic(user_id, topic_id) {
                Ok(selection) => selections.push(selection),
                Err(ServiceError::Engine(EngineError::InsufficientData(details))) => {
                    tracing::debug!(
                        user_id,
                        topic_id = %details.topic_id,
                        difficulty = %details.target,
                        pool_size = details.pool_size,
                        "topic skipped, no candidates"
                    );
                    skipped.push(details);
                }
                Err(err) => return Err(err),
            }
        }

        if selections.is_empty() {
            return Err(ServiceError::InsufficientData(skipped));
        }

        let seed = request.seed.unwrap_or_else(rand::random::<u64>);
        let quiz = assemble_seeded(
            &candidates_from_selections(&selections),
            request.requested_count,
            seed,
        )?;

        tracing::info!(
            user_id,
            seed,
            questions = quiz.len(),
            requested = request.requested_count,
            under_filled = quiz.under_filled,
            "quiz assembled"
        );

        Ok(QuizPlan {
            quiz,
            seed,
            topics: selections.iter().map(TopicSelectionSummary::from).collect(),
            skipped_topics: skipped,
        })
    }

    /// Composite estimate over every catalog topic
    pub fn score_estimate(&self, user_id: &str) -> ServiceResult<ScoreEstimate> {
        let mut per_topic = HashMap::with_capacity(self.catalog.len());
        for topic in self.catalog.topics() {
            let accuracy = self.store.load_topic_accuracy(user_id, &topic.topic_id)?;
            per_topic.insert(topic.topic_id.clone(), accuracy);
        }

        Ok(aggregate(
            &per_topic,
            &self.catalog.weights(),
            &self.catalog.sections(),
        )?)
    }

    pub fn concept_mastery(
        &self,
        user_id: &str,
        concept_id: &ConceptId,
    ) -> ServiceResult<Option<ConceptMasteryRecord>> {
        Ok(self
            .store
            .load_concept_mastery(user_id, concept_id)?
            .map(|stored| stored.value))
    }

    pub fn mastery_summary(&self, user_id: &str) -> ServiceResult<MasterySummary> {
        let records = self.store.list_concept_mastery(user_id)?;
        Ok(MasterySummary::from_records(&records))
    }

    pub fn topic_progress(
        &self,
        user_id: &str,
        topic_id: &TopicId,
    ) -> ServiceResult<Option<TopicProgress>> {
        self.ensure_known_topic(topic_id)?;
        Ok(self
            .store
            .load_topic_progress(user_id, topic_id)?
            .map(|stored| stored.value))
    }
}

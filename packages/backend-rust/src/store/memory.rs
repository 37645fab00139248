use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use parking_lot::RwLock;
use prep_algo::{
    ConceptId, ConceptMasteryRecord, Difficulty, Question, QuestionId, TopicId, TopicProgress,
};

use super::{AttemptCommit, PracticeStore, StoreError, Versioned};

const DEFAULT_ATTEMPT_LOG_CAPACITY: usize = 50;

/// Process-local store. Each map is guarded by its own lock; a commit holds
/// all of them while it compares every record version, so concurrent writers
/// see [`StoreError::Conflict`] instead of losing or half-applying an update.
#[derive(Debug)]
pub struct InMemoryStore {
    concepts: RwLock<HashMap<(String, ConceptId), Versioned<ConceptMasteryRecord>>>,
    topics: RwLock<HashMap<(String, TopicId), Versioned<TopicProgress>>>,
    attempt_log: RwLock<HashMap<(String, TopicId), VecDeque<QuestionId>>>,
    questions: RwLock<HashMap<TopicId, Vec<Question>>>,
    attempt_log_capacity: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPT_LOG_CAPACITY)
    }
}

impl InMemoryStore {
    pub fn new(attempt_log_capacity: usize) -> Self {
        Self {
            concepts: RwLock::new(HashMap::new()),
            topics: RwLock::new(HashMap::new()),
            attempt_log: RwLock::new(HashMap::new()),
            questions: RwLock::new(HashMap::new()),
            attempt_log_capacity: attempt_log_capacity.max(1),
        }
    }

    /// Adds questions to the pool; a question with a known id replaces it
    pub fn add_questions<I>(&self, questions: I)
    where
        I: IntoIterator<Item = Question>,
    {
        let mut guard = self.questions.write();
        for question in questions {
            let bucket = guard.entry(question.topic_id.clone()).or_default();
            match bucket.iter().position(|q| q.id == question.id) {
                Some(index) => bucket[index] = question,
                None => bucket.push(question),
            }
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.read().values().map(Vec::len).sum()
    }
}

fn check_version<K, V>(
    map: &HashMap<K, Versioned<V>>,
    key: &K,
    expected_version: Option<u64>,
    label: impl FnOnce() -> String,
) -> Result<(), StoreError>
where
    K: Eq + Hash,
{
    let actual = map.get(key).map(|stored| stored.version);
    if actual != expected_version {
        return Err(StoreError::Conflict {
            key: label(),
            expected: expected_version,
            actual,
        });
    }
    Ok(())
}

fn put_next<K, V>(
    map: &mut HashMap<K, Versioned<V>>,
    key: K,
    value: &V,
    expected_version: Option<u64>,
) where
    K: Eq + Hash,
    V: Clone,
{
    map.insert(
        key,
        Versioned {
            value: value.clone(),
            version: expected_version.unwrap_or(0) + 1,
        },
    );
}

impl PracticeStore for InMemoryStore {
    fn load_concept_mastery(
        &self,
        user_id: &str,
        concept_id: &ConceptId,
    ) -> Result<Option<Versioned<ConceptMasteryRecord>>, StoreError> {
        let key = (user_id.to_string(), concept_id.clone());
        Ok(self.concepts.read().get(&key).cloned())
    }

    fn list_concept_mastery(&self, user_id: &str) -> Result<Vec<ConceptMasteryRecord>, StoreError> {
        let guard = self.concepts.read();
        let mut records: Vec<ConceptMasteryRecord> = guard
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, stored)| stored.value.clone())
            .collect();
        records.sort_by(|a, b| a.concept_id.cmp(&b.concept_id));
        Ok(records)
    }

    fn load_topic_progress(
        &self,
        user_id: &str,
        topic_id: &TopicId,
    ) -> Result<Option<Versioned<TopicProgress>>, StoreError> {
        let key = (user_id.to_string(), topic_id.clone());
        Ok(self.topics.read().get(&key).cloned())
    }

    fn load_recent_attempt_ids(
        &self,
        user_id: &str,
        topic_id: &TopicId,
        limit: usize,
    ) -> Result<HashSet<QuestionId>, StoreError> {
        let key = (user_id.to_string(), topic_id.clone());
        let guard = self.attempt_log.read();
        Ok(guard
            .get(&key)
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn commit_attempt(&self, user_id: &str, commit: &AttemptCommit) -> Result<(), StoreError> {
        let topic_id = &commit.topic_progress.value.topic_id;

        // Lock order: concepts, topics, attempt log
        let mut concepts = self.concepts.write();
        let mut topics = self.topics.write();
        let mut attempt_log = self.attempt_log.write();

        for write in &commit.concepts {
            let concept_id = &write.value.concept_id;
            check_version(
                &*concepts,
                &(user_id.to_string(), concept_id.clone()),
                write.expected_version,
                || format!("concept:{user_id}:{concept_id}"),
            )?;
        }
        let topic_key = (user_id.to_string(), topic_id.clone());
        check_version(
            &*topics,
            &topic_key,
            commit.topic_progress.expected_version,
            || format!("topic:{user_id}:{topic_id}"),
        )?;

        for write in &commit.concepts {
            put_next(
                &mut *concepts,
                (user_id.to_string(), write.value.concept_id.clone()),
                &write.value,
                write.expected_version,
            );
        }
        put_next(
            &mut *topics,
            topic_key.clone(),
            &commit.topic_progress.value,
            commit.topic_progress.expected_version,
        );

        if let Some(question_id) = &commit.question_id {
            let log = attempt_log.entry(topic_key).or_default();
            log.push_back(question_id.clone());
            while log.len() > self.attempt_log_capacity {
                log.pop_front();
            }
        }
        Ok(())
    }

    fn load_question_pool(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, StoreError> {
        let guard = self.questions.read();
        Ok(guard
            .get(topic_id)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|q| q.difficulty == difficulty)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

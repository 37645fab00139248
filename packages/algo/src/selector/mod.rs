//! Adaptive Difficulty Selector
//!
//! Picks the difficulty to serve next for a topic and narrows the topic's
//! question pool to it. When the target level is thin the pool is widened to
//! the adjacent levels in a fixed order:
//!
//! | target | adds      |
//! |--------|-----------|
//! | 1      | 2         |
//! | 2      | 1, then 3 |
//! | 3      | 2         |
//!
//! Widened candidates always follow the primary ones, so truncation keeps
//! on-target questions first.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{EngineError, InsufficientData, Result};
use crate::sanitize::ensure_percentage;
use crate::types::{Difficulty, Question, QuestionId, TopicId};

/// Primary candidates below this count trigger widening
pub const EXPANSION_THRESHOLD: usize = 3;

/// Candidate set for one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub topic_id: TopicId,
    pub target: Difficulty,
    /// Primary candidates first, then widened ones
    pub questions: Vec<Question>,
    pub primary_count: usize,
}

impl Selection {
    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(|q| q.id.clone()).collect()
    }

    pub fn expanded(&self) -> bool {
        self.questions.len() > self.primary_count
    }
}

/// Target difficulty for a recent accuracy percentage in [0, 100]
pub fn target_difficulty(recent_accuracy: f64) -> Result<Difficulty> {
    let accuracy = ensure_percentage("recentAccuracy", recent_accuracy)?;
    Ok(Difficulty::for_accuracy(accuracy))
}

/// Selects candidates for `topic_id` from `pool`, skipping `excluded` ids.
///
/// Pool entries for other topics are ignored and duplicate ids are served
/// once. Fails with [`EngineError::InsufficientData`] when nothing is left
/// after widening; the caller decides whether to widen the pool or report it.
pub fn select(
    topic_id: &TopicId,
    recent_accuracy: f64,
    pool: &[Question],
    excluded: &HashSet<QuestionId>,
) -> Result<Selection> {
    let target = target_difficulty(recent_accuracy)?;

    let mut seen: HashSet<&QuestionId> = HashSet::new();
    let mut take_level = |level: Difficulty, out: &mut Vec<Question>| {
        for question in pool {
            if question.difficulty != level
                || &question.topic_id != topic_id
                || excluded.contains(&question.id)
            {
                continue;
            }
            if seen.insert(&question.id) {
                out.push(question.clone());
            }
        }
    };

    let mut questions = Vec::new();
    take_level(target, &mut questions);
    let primary_count = questions.len();

    if primary_count < EXPANSION_THRESHOLD {
        for &level in target.adjacent() {
            take_level(level, &mut questions);
        }
    }

    if questions.is_empty() {
        return Err(EngineError::InsufficientData(InsufficientData {
            topic_id: topic_id.clone(),
            target,
            pool_size: pool.len(),
        }));
    }

    Ok(Selection {
        topic_id: topic_id.clone(),
        target,
        questions,
        primary_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> TopicId {
        TopicId::new("quadratics")
    }

    fn pool(spec: &[(&str, Difficulty)]) -> Vec<Question> {
        spec.iter()
            .map(|(id, d)| Question::new(*id, "quadratics", *d))
            .collect()
    }

    fn ids(selection: &Selection) -> Vec<&str> {
        selection.questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_target_mapping() {
        assert_eq!(target_difficulty(45.0).unwrap(), Difficulty::Easy);
        assert_eq!(target_difficulty(65.0).unwrap(), Difficulty::Medium);
        assert_eq!(target_difficulty(92.0).unwrap(), Difficulty::Hard);
    }

    #[test]
    fn test_target_boundaries_inclusive_upward() {
        assert_eq!(target_difficulty(49.999).unwrap(), Difficulty::Easy);
        assert_eq!(target_difficulty(50.0).unwrap(), Difficulty::Medium);
        assert_eq!(target_difficulty(79.999).unwrap(), Difficulty::Medium);
        assert_eq!(target_difficulty(80.0).unwrap(), Difficulty::Hard);
        assert_eq!(target_difficulty(0.0).unwrap(), Difficulty::Easy);
        assert_eq!(target_difficulty(100.0).unwrap(), Difficulty::Hard);
    }

    #[test]
    fn test_out_of_range_accuracy_rejected() {
        assert!(target_difficulty(-1.0).unwrap_err().is_validation());
        assert!(target_difficulty(101.0).is_err());
        assert!(target_difficulty(f64::NAN).is_err());
    }

    #[test]
    fn test_enough_primary_candidates_no_expansion() {
        let pool = pool(&[
            ("q1", Difficulty::Medium),
            ("q2", Difficulty::Easy),
            ("q3", Difficulty::Medium),
            ("q4", Difficulty::Medium),
        ]);
        let selection = select(&topic(), 60.0, &pool, &HashSet::new()).unwrap();
        assert_eq!(ids(&selection), vec!["q1", "q3", "q4"]);
        assert!(!selection.expanded());
    }

    #[test]
    fn test_medium_expands_easy_then_hard() {
        let pool = pool(&[
            ("h1", Difficulty::Hard),
            ("m1", Difficulty::Medium),
            ("e1", Difficulty::Easy),
        ]);
        let selection = select(&topic(), 70.0, &pool, &HashSet::new()).unwrap();
        assert_eq!(ids(&selection), vec!["m1", "e1", "h1"]);
        assert_eq!(selection.primary_count, 1);
        assert!(selection.expanded());
    }

    #[test]
    fn test_hard_expands_only_medium() {
        let pool = pool(&[
            ("e1", Difficulty::Easy),
            ("m1", Difficulty::Medium),
            ("h1", Difficulty::Hard),
        ]);
        let selection = select(&topic(), 95.0, &pool, &HashSet::new()).unwrap();
        assert_eq!(ids(&selection), vec!["h1", "m1"]);
    }

    #[test]
    fn test_excluded_questions_skipped() {
        let pool = pool(&[
            ("e1", Difficulty::Easy),
            ("e2", Difficulty::Easy),
            ("e3", Difficulty::Easy),
            ("m1", Difficulty::Medium),
        ]);
        let excluded = HashSet::from([QuestionId::new("e2")]);
        let selection = select(&topic(), 10.0, &pool, &excluded).unwrap();
        assert_eq!(ids(&selection), vec!["e1", "e3", "m1"]);
    }

    #[test]
    fn test_other_topics_and_duplicates_ignored() {
        let mut pool = pool(&[("e1", Difficulty::Easy), ("e1", Difficulty::Easy)]);
        pool.push(Question::new("x1", "geometry", Difficulty::Easy));
        let selection = select(&topic(), 10.0, &pool, &HashSet::new()).unwrap();
        assert_eq!(ids(&selection), vec!["e1"]);
    }

    #[test]
    fn test_empty_after_expansion_is_insufficient_data() {
        // Target easy never widens to hard.
        let pool = pool(&[("h1", Difficulty::Hard)]);
        let err = select(&topic(), 20.0, &pool, &HashSet::new()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientData(InsufficientData {
                topic_id: topic(),
                target: Difficulty::Easy,
                pool_size: 1,
            })
        );
    }
}

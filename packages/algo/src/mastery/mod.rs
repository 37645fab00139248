//! Concept Mastery Evaluator
//!
//! Derives a concept's mastery level from its attempt counters. The level is
//! re-derived from scratch on every attempt, so a MASTERED concept drops back
//! to STRUGGLING after a run of misses.
//!
//! The update is exposed as `evaluate(existing, concept_id, outcome) -> next`
//! so a store can re-apply it against a freshly read record after a write
//! conflict. It takes the concept id because one outcome can tag several
//! concepts, each folded into its own record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::sanitize::validate_mastery_record;
use crate::types::{
    AttemptOutcome, ConceptId, ConceptMasteryRecord, MasteryLevel, MASTERY_ACCURACY,
    MIN_ATTEMPTS_FOR_MASTERY, STRUGGLING_ACCURACY, STRUGGLING_STREAK_LIMIT,
};

/// Mastery level for the given counters.
///
/// With fewer than [`MIN_ATTEMPTS_FOR_MASTERY`] attempts a concept can be at
/// most UNDERSTANDING, and the streak is not consulted.
pub fn classify(attempted: u32, accuracy: f64, struggling_streak: u32) -> MasteryLevel {
    if attempted == 0 {
        return MasteryLevel::NotAttempted;
    }

    if attempted < MIN_ATTEMPTS_FOR_MASTERY {
        return if accuracy < STRUGGLING_ACCURACY {
            MasteryLevel::Struggling
        } else {
            MasteryLevel::Understanding
        };
    }

    if struggling_streak >= STRUGGLING_STREAK_LIMIT || accuracy < STRUGGLING_ACCURACY {
        MasteryLevel::Struggling
    } else if accuracy >= MASTERY_ACCURACY {
        MasteryLevel::Mastered
    } else {
        MasteryLevel::Understanding
    }
}

/// Applies one graded attempt to a concept's record.
///
/// `existing` is `None` for a concept the learner has never seen. The outcome
/// must be tagged with `concept_id`, and an existing record must belong to the
/// outcome's topic.
pub fn evaluate(
    existing: Option<&ConceptMasteryRecord>,
    concept_id: &ConceptId,
    outcome: &AttemptOutcome,
) -> Result<ConceptMasteryRecord> {
    if !outcome.concept_ids.contains(concept_id) {
        return Err(EngineError::validation(format!(
            "attempt is not tagged with concept {concept_id}"
        )));
    }

    let mut next = match existing {
        Some(record) => {
            validate_mastery_record(record)?;
            if &record.concept_id != concept_id {
                return Err(EngineError::validation(format!(
                    "record for concept {} passed while evaluating {concept_id}",
                    record.concept_id
                )));
            }
            if record.topic_id != outcome.topic_id {
                return Err(EngineError::validation(format!(
                    "concept {concept_id} belongs to topic {}, attempt was for {}",
                    record.topic_id, outcome.topic_id
                )));
            }
            record.clone()
        }
        None => ConceptMasteryRecord::zeroed(
            concept_id.clone(),
            outcome.topic_id.clone(),
            outcome.timestamp,
        ),
    };

    let previous_level = next.mastery_level;

    next.questions_attempted = next
        .questions_attempted
        .checked_add(1)
        .ok_or_else(|| EngineError::validation("questionsAttempted overflow"))?;

    if outcome.correct {
        next.questions_correct += 1;
        next.struggling_streak = 0;
    } else {
        next.struggling_streak += 1;
    }

    next.accuracy = next.questions_correct as f64 / next.questions_attempted as f64;
    next.mastery_level = classify(
        next.questions_attempted,
        next.accuracy,
        next.struggling_streak,
    );

    if next.mastery_level == MasteryLevel::Mastered && previous_level != MasteryLevel::Mastered {
        next.mastered_at = Some(outcome.timestamp);
    }

    next.first_encountered = next.first_encountered.min(outcome.timestamp);
    next.last_encountered = next.last_encountered.max(outcome.timestamp);

    Ok(next)
}

/// Applies one attempt to every concept it is tagged with.
///
/// Either every concept is updated or none is; records are returned in
/// concept id order.
pub fn evaluate_attempt(
    existing: &HashMap<ConceptId, ConceptMasteryRecord>,
    outcome: &AttemptOutcome,
) -> Result<Vec<ConceptMasteryRecord>> {
    if outcome.concept_ids.is_empty() {
        return Err(EngineError::validation(
            "attempt must be tagged with at least one concept",
        ));
    }

    outcome
        .concept_ids
        .iter()
        .map(|concept_id| evaluate(existing.get(concept_id), concept_id, outcome))
        .collect()
}

/// Rebuilds a concept's record from its full attempt history.
///
/// Attempts not tagged with `concept_id` are skipped. Returns `None` when no
/// attempt touches the concept.
pub fn replay<'a, I>(concept_id: &ConceptId, history: I) -> Result<Option<ConceptMasteryRecord>>
where
    I: IntoIterator<Item = &'a AttemptOutcome>,
{
    let mut record: Option<ConceptMasteryRecord> = None;
    for outcome in history {
        if !outcome.concept_ids.contains(concept_id) {
            continue;
        }
        record = Some(evaluate(record.as_ref(), concept_id, outcome)?);
    }
    Ok(record)
}

/// Per-level concept counts for one learner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySummary {
    pub not_attempted: u32,
    pub struggling: u32,
    pub understanding: u32,
    pub mastered: u32,
}

impl MasterySummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ConceptMasteryRecord>,
    {
        let mut summary = Self::default();
        for record in records {
            match record.mastery_level {
                MasteryLevel::NotAttempted => summary.not_attempted += 1,
                MasteryLevel::Struggling => summary.struggling += 1,
                MasteryLevel::Understanding => summary.understanding += 1,
                MasteryLevel::Mastered => summary.mastered += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> u32 {
        self.not_attempted + self.struggling + self.understanding + self.mastered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, TopicId};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn concept() -> ConceptId {
        ConceptId::new("slope-intercept")
    }

    fn attempt(minute: i64, correct: bool) -> AttemptOutcome {
        AttemptOutcome {
            timestamp: t0() + Duration::minutes(minute),
            correct,
            topic_id: TopicId::new("linear-functions"),
            concept_ids: BTreeSet::from([concept()]),
            difficulty: Difficulty::Medium,
            question_id: None,
        }
    }

    fn fold(results: &[bool]) -> ConceptMasteryRecord {
        let mut record = None;
        for (i, &correct) in results.iter().enumerate() {
            record = Some(evaluate(record.as_ref(), &concept(), &attempt(i as i64, correct)).unwrap());
        }
        record.unwrap()
    }

    #[test]
    fn test_three_wrong_is_struggling() {
        let record = fold(&[false, false, false]);
        assert_eq!(record.questions_attempted, 3);
        assert_eq!(record.questions_correct, 0);
        assert_eq!(record.accuracy, 0.0);
        assert_eq!(record.struggling_streak, 3);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
        assert!(record.mastered_at.is_none());
    }

    #[test]
    fn test_four_correct_is_mastered_once() {
        let record = fold(&[true, true, true, true]);
        assert_eq!(record.accuracy, 1.0);
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);
        // Mastered on the third attempt; the fourth must not restamp.
        assert_eq!(record.mastered_at, Some(t0() + Duration::minutes(2)));
    }

    #[test]
    fn test_insufficient_data_caps_at_understanding() {
        let record = fold(&[true, true]);
        assert_eq!(record.accuracy, 1.0);
        assert_eq!(record.mastery_level, MasteryLevel::Understanding);

        let record = fold(&[false]);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);

        let record = fold(&[true, false]);
        assert_eq!(record.mastery_level, MasteryLevel::Understanding);
    }

    #[test]
    fn test_streak_forces_struggling_despite_accuracy() {
        // 7/10 correct, last three wrong: accuracy 0.7 but streak 3
        let record = fold(&[
            true, true, true, true, true, true, true, false, false, false,
        ]);
        assert!(record.accuracy >= STRUGGLING_ACCURACY);
        assert_eq!(record.struggling_streak, 3);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
    }

    #[test]
    fn test_mastery_is_not_monotonic() {
        let mut results = vec![true; 5];
        results.extend([false, false, false]);
        let record = fold(&results);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
        // The historical stamp survives the demotion.
        assert_eq!(record.mastered_at, Some(t0() + Duration::minutes(2)));
    }

    #[test]
    fn test_remastery_restamps() {
        let mut results = vec![true; 3];
        results.extend([false, false, false]);
        results.extend([true; 12]);
        let record = fold(&results);
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);
        assert!(record.mastered_at.unwrap() > t0() + Duration::minutes(5));
    }

    #[test]
    fn test_correct_resets_streak() {
        let record = fold(&[false, false, true]);
        assert_eq!(record.struggling_streak, 0);
    }

    #[test]
    fn test_rejects_untagged_concept() {
        let mut outcome = attempt(0, true);
        outcome.concept_ids.clear();
        let err = evaluate(None, &concept(), &outcome).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_corrupt_existing_record() {
        let mut record = fold(&[true, false]);
        record.questions_correct = 5;
        let err = evaluate(Some(&record), &concept(), &attempt(3, true)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_topic_mismatch() {
        let record = fold(&[true]);
        let mut outcome = attempt(1, true);
        outcome.topic_id = TopicId::new("geometry");
        assert!(evaluate(Some(&record), &concept(), &outcome).is_err());
    }

    #[test]
    fn test_encounter_window_tracks_out_of_order_attempts() {
        let late = evaluate(None, &concept(), &attempt(10, true)).unwrap();
        let early = evaluate(Some(&late), &concept(), &attempt(-5, true)).unwrap();
        assert_eq!(early.first_encountered, t0() - Duration::minutes(5));
        assert_eq!(early.last_encountered, t0() + Duration::minutes(10));
    }

    #[test]
    fn test_evaluate_attempt_updates_every_concept() {
        let mut outcome = attempt(0, false);
        outcome.concept_ids.insert(ConceptId::new("systems-of-equations"));
        let records = evaluate_attempt(&HashMap::new(), &outcome).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.struggling_streak == 1));
    }

    #[test]
    fn test_replay_matches_incremental_fold() {
        let results = [true, false, true, true, false, false, false, true, true];
        let history: Vec<_> = results
            .iter()
            .enumerate()
            .map(|(i, &c)| attempt(i as i64, c))
            .collect();
        let replayed = replay(&concept(), &history).unwrap().unwrap();
        assert_eq!(replayed, fold(&results));
    }

    #[test]
    fn test_summary_counts_levels() {
        let records = vec![fold(&[true, true, true]), fold(&[false]), fold(&[true])];
        let summary = MasterySummary::from_records(&records);
        assert_eq!(summary.mastered, 1);
        assert_eq!(summary.struggling, 1);
        assert_eq!(summary.understanding, 1);
        assert_eq!(summary.total(), 3);
    }
}

//! Input Validation
//!
//! Range checks shared by the engine modules. Every check rejects rather than
//! clamps: a caller handing in a NaN accuracy has a bug worth surfacing.

use crate::error::{EngineError, Result};
use crate::types::{ConceptMasteryRecord, MasteryLevel, TopicProgress, RECENT_RESULTS_WINDOW};

const ACCURACY_TOLERANCE: f64 = 1e-9;

/// 检查数值是否为有限值 (非 NaN / Inf)
pub fn is_valid_number(value: f64) -> bool {
    value.is_finite()
}

/// Percentage in [0, 100]
pub fn ensure_percentage(name: &str, value: f64) -> Result<f64> {
    if !is_valid_number(value) || !(0.0..=100.0).contains(&value) {
        return Err(EngineError::validation(format!(
            "{name} must be a percentage in [0, 100], got {value}"
        )));
    }
    Ok(value)
}

/// Finite, non-negative value
pub fn ensure_non_negative(name: &str, value: f64) -> Result<f64> {
    if !is_valid_number(value) || value < 0.0 {
        return Err(EngineError::validation(format!(
            "{name} must be finite and non-negative, got {value}"
        )));
    }
    Ok(value)
}

/// Checks the counter invariants of a stored mastery record
pub fn validate_mastery_record(record: &ConceptMasteryRecord) -> Result<()> {
    let attempted = record.questions_attempted;
    let correct = record.questions_correct;

    if correct > attempted {
        return Err(EngineError::validation(format!(
            "concept {}: questionsCorrect ({correct}) exceeds questionsAttempted ({attempted})",
            record.concept_id
        )));
    }

    if record.struggling_streak > attempted - correct {
        return Err(EngineError::validation(format!(
            "concept {}: strugglingStreak ({}) exceeds incorrect attempts ({})",
            record.concept_id,
            record.struggling_streak,
            attempted - correct
        )));
    }

    let expected = if attempted > 0 {
        correct as f64 / attempted as f64
    } else {
        0.0
    };
    if !is_valid_number(record.accuracy) || (record.accuracy - expected).abs() > ACCURACY_TOLERANCE {
        return Err(EngineError::validation(format!(
            "concept {}: accuracy {} does not match {correct}/{attempted}",
            record.concept_id, record.accuracy
        )));
    }

    if (attempted == 0) != (record.mastery_level == MasteryLevel::NotAttempted) {
        return Err(EngineError::validation(format!(
            "concept {}: level {:?} inconsistent with {attempted} attempts",
            record.concept_id, record.mastery_level
        )));
    }

    if record.first_encountered > record.last_encountered {
        return Err(EngineError::validation(format!(
            "concept {}: firstEncountered is after lastEncountered",
            record.concept_id
        )));
    }

    Ok(())
}

/// Checks the window invariants of a stored topic progress record
pub fn validate_topic_progress(progress: &TopicProgress) -> Result<()> {
    let window = progress.last10_results.len();
    if window > RECENT_RESULTS_WINDOW {
        return Err(EngineError::validation(format!(
            "topic {}: last10Results holds {window} entries",
            progress.topic_id
        )));
    }
    if (window as u64) > u64::from(progress.total_questions_answered) {
        return Err(EngineError::validation(format!(
            "topic {}: {window} recent results but only {} answered",
            progress.topic_id, progress.total_questions_answered
        )));
    }
    ensure_percentage("accuracyLast10", progress.accuracy_last10)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConceptId, TopicId};
    use chrono::Utc;

    fn record(attempted: u32, correct: u32, streak: u32) -> ConceptMasteryRecord {
        let mut record = ConceptMasteryRecord::zeroed(
            ConceptId::new("linear-equations"),
            TopicId::new("algebra"),
            Utc::now(),
        );
        record.questions_attempted = attempted;
        record.questions_correct = correct;
        record.struggling_streak = streak;
        record.accuracy = if attempted > 0 {
            correct as f64 / attempted as f64
        } else {
            0.0
        };
        if attempted > 0 {
            record.mastery_level = MasteryLevel::Understanding;
        }
        record
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(ensure_percentage("accuracy", 0.0).is_ok());
        assert!(ensure_percentage("accuracy", 100.0).is_ok());
        assert!(ensure_percentage("accuracy", -0.1).is_err());
        assert!(ensure_percentage("accuracy", 100.1).is_err());
        assert!(ensure_percentage("accuracy", f64::NAN).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(ensure_non_negative("weight", 0.0).is_ok());
        assert!(ensure_non_negative("weight", -1.0).is_err());
        assert!(ensure_non_negative("weight", f64::INFINITY).is_err());
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(validate_mastery_record(&record(5, 3, 1)).is_ok());
        assert!(validate_mastery_record(&record(0, 0, 0)).is_ok());
    }

    #[test]
    fn test_level_without_attempts_rejected() {
        let mut bogus = record(0, 0, 0);
        bogus.mastery_level = MasteryLevel::Mastered;
        assert!(validate_mastery_record(&bogus).is_err());
    }

    #[test]
    fn test_correct_above_attempted_rejected() {
        let err = validate_mastery_record(&record(2, 3, 0)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_streak_above_misses_rejected() {
        assert!(validate_mastery_record(&record(4, 3, 2)).is_err());
    }

    #[test]
    fn test_stale_accuracy_rejected() {
        let mut stale = record(4, 2, 0);
        stale.accuracy = 0.9;
        assert!(validate_mastery_record(&stale).is_err());
    }
}

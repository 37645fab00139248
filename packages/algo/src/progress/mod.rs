//! Topic Progress
//!
//! Rolling window of the last ten results per topic. The window's accuracy is
//! what the difficulty selector reads as "recent accuracy".

use std::collections::VecDeque;

use crate::error::{EngineError, Result};
use crate::sanitize::validate_topic_progress;
use crate::types::{Difficulty, TopicAccuracy, TopicId, TopicProgress, RECENT_RESULTS_WINDOW};

impl TopicProgress {
    /// Empty progress; starts at medium difficulty like a neutral-accuracy topic
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            level: Difficulty::Medium,
            total_questions_answered: 0,
            last10_results: VecDeque::with_capacity(RECENT_RESULTS_WINDOW),
            accuracy_last10: 0.0,
        }
    }

    /// Pushes one result, evicting the oldest once the window is full
    pub fn record(&mut self, correct: bool) {
        self.total_questions_answered = self.total_questions_answered.saturating_add(1);
        self.last10_results.push_back(correct);
        while self.last10_results.len() > RECENT_RESULTS_WINDOW {
            self.last10_results.pop_front();
        }

        let hits = self.last10_results.iter().filter(|&&r| r).count();
        self.accuracy_last10 = 100.0 * hits as f64 / self.last10_results.len() as f64;
        self.level = Difficulty::for_accuracy(self.accuracy_last10);
    }

    /// Accuracy pair for selection and scoring; neutral when nothing answered
    pub fn topic_accuracy(&self) -> TopicAccuracy {
        if self.total_questions_answered == 0 || self.last10_results.is_empty() {
            return TopicAccuracy {
                attempted: self.total_questions_answered,
                ..TopicAccuracy::NEUTRAL
            };
        }
        TopicAccuracy {
            accuracy: self.accuracy_last10,
            attempted: self.total_questions_answered,
        }
    }
}

/// Folds one result into a topic's stored progress
pub fn record_result(
    existing: Option<&TopicProgress>,
    topic_id: &TopicId,
    correct: bool,
) -> Result<TopicProgress> {
    let mut next = match existing {
        Some(progress) => {
            validate_topic_progress(progress)?;
            if &progress.topic_id != topic_id {
                return Err(EngineError::validation(format!(
                    "progress for topic {} passed while recording {topic_id}",
                    progress.topic_id
                )));
            }
            progress.clone()
        }
        None => TopicProgress::new(topic_id.clone()),
    };
    next.record(correct);
    Ok(next)
}

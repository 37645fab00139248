//! Common Types and Constants
//!
//! Shared data structures used across all engine modules.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Attempts below this count are evaluated on the insufficient-data branch
pub const MIN_ATTEMPTS_FOR_MASTERY: u32 = 3;

/// Accuracy at or above which a concept counts as mastered
pub const MASTERY_ACCURACY: f64 = 0.8;

/// Accuracy below which a concept counts as struggling
pub const STRUGGLING_ACCURACY: f64 = 0.4;

/// Consecutive misses that force STRUGGLING regardless of accuracy
pub const STRUGGLING_STREAK_LIMIT: u32 = 3;

/// Recent accuracy (percent) below which easy questions are served
pub const MEDIUM_ACCURACY_FLOOR: f64 = 50.0;

/// Recent accuracy (percent) at or above which hard questions are served
pub const HARD_ACCURACY_FLOOR: f64 = 80.0;

/// Length of the per-topic recent results window
pub const RECENT_RESULTS_WINDOW: usize = 10;

/// Accuracy assumed for a topic with no history
pub const NEUTRAL_ACCURACY: f64 = 50.0;

// ==================== Identifiers ====================

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Canonical topic identifier, resolved once at the system boundary
    TopicId
);
opaque_id!(
    /// Atomic skill unit tracked for fine-grained mastery
    ConceptId
);
opaque_id!(QuestionId);

// ==================== Difficulty ====================

/// Question difficulty, serialized as `1 | 2 | 3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Target difficulty for a recent accuracy percentage.
    ///
    /// Boundaries are inclusive on the upper side: 50 maps to medium, 80 to hard.
    pub fn for_accuracy(recent_accuracy: f64) -> Self {
        if recent_accuracy < MEDIUM_ACCURACY_FLOOR {
            Difficulty::Easy
        } else if recent_accuracy < HARD_ACCURACY_FLOOR {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    /// Adjacent levels consulted when the target level has too few candidates
    pub fn adjacent(self) -> &'static [Difficulty] {
        match self {
            Difficulty::Easy => &[Difficulty::Medium],
            Difficulty::Medium => &[Difficulty::Easy, Difficulty::Hard],
            Difficulty::Hard => &[Difficulty::Medium],
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(format!("difficulty must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.level()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

// ==================== Mastery Types ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MasteryLevel {
    #[default]
    NotAttempted,
    Struggling,
    Understanding,
    Mastered,
}

/// One graded answer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub timestamp: DateTime<Utc>,
    pub correct: bool,
    pub topic_id: TopicId,
    pub concept_ids: BTreeSet<ConceptId>,
    pub difficulty: Difficulty,
    /// Question answered, when known; feeds the recent-attempt exclusion list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMasteryRecord {
    pub concept_id: ConceptId,
    pub topic_id: TopicId,
    pub questions_attempted: u32,
    pub questions_correct: u32,
    /// Fraction in [0, 1]; 0 when nothing attempted
    pub accuracy: f64,
    pub struggling_streak: u32,
    pub mastery_level: MasteryLevel,
    pub first_encountered: DateTime<Utc>,
    pub last_encountered: DateTime<Utc>,
    pub mastered_at: Option<DateTime<Utc>>,
}

impl ConceptMasteryRecord {
    /// Zeroed record for a concept seen for the first time at `at`
    pub fn zeroed(concept_id: ConceptId, topic_id: TopicId, at: DateTime<Utc>) -> Self {
        Self {
            concept_id,
            topic_id,
            questions_attempted: 0,
            questions_correct: 0,
            accuracy: 0.0,
            struggling_streak: 0,
            mastery_level: MasteryLevel::NotAttempted,
            first_encountered: at,
            last_encountered: at,
            mastered_at: None,
        }
    }
}

// ==================== Topic Types ====================

/// Rolling per-topic performance used to pick the next difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub topic_id: TopicId,
    pub level: Difficulty,
    pub total_questions_answered: u32,
    /// Oldest result first; never longer than [`RECENT_RESULTS_WINDOW`]
    #[serde(rename = "last10Results")]
    pub last10_results: VecDeque<bool>,
    /// Percentage in [0, 100]
    #[serde(rename = "accuracyLast10")]
    pub accuracy_last10: f64,
}

/// Accuracy summary for one topic as read from the store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAccuracy {
    /// Percentage in [0, 100]
    pub accuracy: f64,
    pub attempted: u32,
}

impl TopicAccuracy {
    /// Default for a topic without history: medium confidence, not worst case
    pub const NEUTRAL: TopicAccuracy = TopicAccuracy {
        accuracy: NEUTRAL_ACCURACY,
        attempted: 0,
    };
}

impl Default for TopicAccuracy {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ==================== Question Types ====================

/// Question as seen by the engine; content fields live elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub topic_id: TopicId,
    pub difficulty: Difficulty,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, topic_id: impl Into<TopicId>, difficulty: Difficulty) -> Self {
        Self {
            id: id.into(),
            topic_id: topic_id.into(),
            difficulty,
        }
    }
}

// ==================== Score Types ====================

/// Test section a topic is scored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    /// Reading & Writing, reported as `sectionA`
    #[serde(rename = "RW")]
    ReadingWriting,
    /// Math, reported as `sectionB`
    #[serde(rename = "Math")]
    Math,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreakdown {
    pub section_a: u16,
    pub section_b: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEstimate {
    /// `None` until at least one topic has attempt data
    pub composite_score: Option<u16>,
    pub confidence: u8,
    pub breakdown: SectionBreakdown,
    pub topics_with_data: u32,
}

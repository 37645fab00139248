//! Proficiency Aggregator
//!
//! Folds per-topic accuracy into a composite score with a confidence figure.
//!
//! Each section is scored on 200..=800 from the weight-averaged accuracy of
//! its topics; the composite is the sum of both sections (400..=1600).
//! Confidence blends how many defined topics have data (70%) with how evenly
//! that data is spread across the two sections (30%).

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::sanitize::{ensure_non_negative, ensure_percentage};
use crate::types::{ScoreEstimate, Section, SectionBreakdown, TopicAccuracy, TopicId};

pub const SECTION_FLOOR: f64 = 200.0;
pub const SECTION_CEILING: f64 = 800.0;
pub const COMPOSITE_FLOOR: u16 = 400;
pub const COMPOSITE_CEILING: u16 = 1600;

const SECTION_SPAN: f64 = SECTION_CEILING - SECTION_FLOOR;
const COVERAGE_WEIGHT: f64 = 70.0;
const BALANCE_WEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default)]
struct SectionTally {
    contribution: f64,
    weight: f64,
    topics: u32,
}

impl SectionTally {
    fn score(&self) -> u16 {
        if self.weight <= 0.0 {
            return SECTION_FLOOR as u16;
        }
        let raw = SECTION_FLOOR + SECTION_SPAN * (self.contribution / self.weight);
        raw.clamp(SECTION_FLOOR, SECTION_CEILING).round() as u16
    }
}

/// Aggregates per-topic accuracy into a [`ScoreEstimate`].
///
/// `weights` defines the topic universe: its size is the coverage
/// denominator. Topics with `attempted == 0` are ignored; every other topic
/// must carry a weight and a section. With no scored topic the result has
/// `composite_score: None` and zero confidence.
pub fn aggregate(
    per_topic: &HashMap<TopicId, TopicAccuracy>,
    weights: &HashMap<TopicId, f64>,
    section_of: &HashMap<TopicId, Section>,
) -> Result<ScoreEstimate> {
    let mut reading_writing = SectionTally::default();
    let mut math = SectionTally::default();
    let mut topics_with_data = 0u32;

    for (topic_id, topic) in per_topic {
        if topic.attempted == 0 {
            continue;
        }
        let accuracy = ensure_percentage("accuracy", topic.accuracy)?;

        let weight = weights.get(topic_id).copied().ok_or_else(|| {
            EngineError::validation(format!("topic {topic_id} has data but no weight"))
        })?;
        let weight = ensure_non_negative("weight", weight)?;

        let section = section_of.get(topic_id).ok_or_else(|| {
            EngineError::validation(format!("topic {topic_id} has data but no section"))
        })?;

        let tally = match section {
            Section::ReadingWriting => &mut reading_writing,
            Section::Math => &mut math,
        };
        tally.contribution += (accuracy / 100.0) * weight;
        tally.weight += weight;
        tally.topics += 1;
        topics_with_data += 1;
    }

    let breakdown = SectionBreakdown {
        section_a: reading_writing.score(),
        section_b: math.score(),
    };

    if topics_with_data == 0 {
        return Ok(ScoreEstimate {
            composite_score: None,
            confidence: 0,
            breakdown,
            topics_with_data: 0,
        });
    }

    let composite = (breakdown.section_a + breakdown.section_b)
        .clamp(COMPOSITE_FLOOR, COMPOSITE_CEILING);

    let total_topics = weights.len().max(topics_with_data as usize);
    let data_coverage = topics_with_data as f64 / total_topics as f64;
    let (fewer, more) = if reading_writing.topics <= math.topics {
        (reading_writing.topics, math.topics)
    } else {
        (math.topics, reading_writing.topics)
    };
    let section_balance = fewer as f64 / more.max(1) as f64;
    let confidence = (data_coverage * COVERAGE_WEIGHT + section_balance * BALANCE_WEIGHT)
        .clamp(0.0, 100.0)
        .round() as u8;

    Ok(ScoreEstimate {
        composite_score: Some(composite),
        confidence,
        breakdown,
        topics_with_data,
    })
}

//! Quiz Assembler
//!
//! Merges per-topic candidate lists into one practice set: deduplicate, apply
//! an unbiased Fisher-Yates shuffle, truncate to the requested size. A short
//! candidate list yields a short quiz flagged `under_filled`; it is never
//! padded with repeats.
//!
//! On-target (primary) candidates and widened ones are shuffled as two
//! separate blocks and joined primary-first, so truncation only drops widened
//! questions while on-target ones remain. Order within each block is uniform.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::selector::Selection;
use crate::types::{Question, QuestionId, TopicId};

/// Expected time per question when estimating quiz length
pub const MINUTES_PER_QUESTION: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSpec {
    pub question_ids: Vec<QuestionId>,
    /// Rounded mean difficulty of the selected questions; `None` for an empty quiz
    pub average_difficulty: Option<u8>,
    pub estimated_minutes: u32,
    pub requested_count: usize,
    /// Fewer unique candidates than requested were available
    pub under_filled: bool,
}

impl QuizSpec {
    pub fn len(&self) -> usize {
        self.question_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }
}

/// One topic's candidates, split at the selector's target difficulty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicCandidates {
    pub primary: Vec<Question>,
    /// Adjacent-difficulty questions added when the target level was thin
    pub expanded: Vec<Question>,
}

impl From<Vec<Question>> for TopicCandidates {
    /// Every question counts as on-target
    fn from(primary: Vec<Question>) -> Self {
        Self {
            primary,
            expanded: Vec::new(),
        }
    }
}

impl From<&Selection> for TopicCandidates {
    fn from(selection: &Selection) -> Self {
        let split = selection.primary_count.min(selection.questions.len());
        let (primary, expanded) = selection.questions.split_at(split);
        Self {
            primary: primary.to_vec(),
            expanded: expanded.to_vec(),
        }
    }
}

/// Candidate lists keyed by topic, in the shape [`assemble`] takes
pub fn candidates_from_selections<'a, I>(selections: I) -> BTreeMap<TopicId, TopicCandidates>
where
    I: IntoIterator<Item = &'a Selection>,
{
    let mut merged: BTreeMap<TopicId, TopicCandidates> = BTreeMap::new();
    for selection in selections {
        let split = TopicCandidates::from(selection);
        let entry = merged.entry(selection.topic_id.clone()).or_default();
        entry.primary.extend(split.primary);
        entry.expanded.extend(split.expanded);
    }
    merged
}

/// In-place Fisher-Yates: for i from the last index down to 1, swap i with a
/// uniform j in [0, i].
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Builds a quiz of up to `requested_count` unique questions.
///
/// Topics are merged in key order before shuffling, so a seeded `rng` gives
/// a reproducible quiz. A question listed as primary anywhere is treated as
/// primary.
pub fn assemble<R: Rng + ?Sized>(
    per_topic: &BTreeMap<TopicId, TopicCandidates>,
    requested_count: usize,
    rng: &mut R,
) -> Result<QuizSpec> {
    if requested_count == 0 {
        return Err(EngineError::validation("requestedCount must be positive"));
    }

    let mut seen: HashSet<&QuestionId> = HashSet::new();
    let mut primary: Vec<&Question> = per_topic
        .values()
        .flat_map(|c| c.primary.iter())
        .filter(|q| seen.insert(&q.id))
        .collect();
    let mut expanded: Vec<&Question> = per_topic
        .values()
        .flat_map(|c| c.expanded.iter())
        .filter(|q| seen.insert(&q.id))
        .collect();

    fisher_yates(&mut primary, rng);
    fisher_yates(&mut expanded, rng);

    let mut merged = primary;
    merged.append(&mut expanded);
    merged.truncate(requested_count);

    let count = merged.len();
    let average_difficulty = if count == 0 {
        None
    } else {
        let total: u32 = merged.iter().map(|q| u32::from(q.difficulty.level())).sum();
        Some((total as f64 / count as f64).round() as u8)
    };

    Ok(QuizSpec {
        question_ids: merged.into_iter().map(|q| q.id.clone()).collect(),
        average_difficulty,
        estimated_minutes: (count as f64 * MINUTES_PER_QUESTION).ceil() as u32,
        requested_count,
        under_filled: count < requested_count,
    })
}

/// [`assemble`] with a ChaCha8 stream seeded from `seed`
pub fn assemble_seeded(
    per_topic: &BTreeMap<TopicId, TopicCandidates>,
    requested_count: usize,
    seed: u64,
) -> Result<QuizSpec> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    assemble(per_topic, requested_count, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn single_topic(n: usize) -> BTreeMap<TopicId, TopicCandidates> {
        let questions: Vec<Question> = (0..n)
            .map(|i| Question::new(format!("q{i}"), "vocab", Difficulty::Medium))
            .collect();
        BTreeMap::from([(TopicId::new("vocab"), questions.into())])
    }

    #[test]
    fn test_twenty_choose_ten_unique() {
        let pool = single_topic(20);
        let quiz = assemble_seeded(&pool, 10, 7).unwrap();
        assert_eq!(quiz.len(), 10);
        assert!(!quiz.under_filled);

        let unique: HashSet<_> = quiz.question_ids.iter().collect();
        assert_eq!(unique.len(), 10);
        let pool_ids: HashSet<_> = pool
            .values()
            .flat_map(|c| c.primary.iter())
            .map(|q| q.id.clone())
            .collect();
        assert!(quiz.question_ids.iter().all(|id| pool_ids.contains(id)));
    }

    #[test]
    fn test_different_seeds_different_orders() {
        let pool = single_topic(20);
        let a = assemble_seeded(&pool, 10, 1).unwrap();
        let b = assemble_seeded(&pool, 10, 2).unwrap();
        assert_ne!(a.question_ids, b.question_ids);
    }

    #[test]
    fn test_same_seed_reproducible() {
        let pool = single_topic(20);
        assert_eq!(
            assemble_seeded(&pool, 10, 99).unwrap(),
            assemble_seeded(&pool, 10, 99).unwrap()
        );
    }

    #[test]
    fn test_short_pool_under_filled_without_repeats() {
        let mut pool = single_topic(3);
        pool.insert(
            TopicId::new("grammar"),
            vec![
                Question::new("q1", "grammar", Difficulty::Medium),
                Question::new("g1", "grammar", Difficulty::Hard),
            ]
            .into(),
        );
        let quiz = assemble_seeded(&pool, 10, 3).unwrap();
        assert_eq!(quiz.len(), 4);
        assert!(quiz.under_filled);
        assert_eq!(quiz.estimated_minutes, 6);
    }

    #[test]
    fn test_metadata() {
        let pool = BTreeMap::from([(
            TopicId::new("mixed"),
            vec![
                Question::new("a", "mixed", Difficulty::Easy),
                Question::new("b", "mixed", Difficulty::Hard),
                Question::new("c", "mixed", Difficulty::Hard),
            ]
            .into(),
        )]);
        let quiz = assemble_seeded(&pool, 3, 11).unwrap();
        // mean 7/3 = 2.33 rounds to 2; 3 * 1.5 = 4.5 rounds up to 5
        assert_eq!(quiz.average_difficulty, Some(2));
        assert_eq!(quiz.estimated_minutes, 5);
    }

    #[test]
    fn test_empty_candidates() {
        let quiz = assemble_seeded(&BTreeMap::new(), 5, 0).unwrap();
        assert!(quiz.is_empty());
        assert!(quiz.under_filled);
        assert_eq!(quiz.average_difficulty, None);
        assert_eq!(quiz.estimated_minutes, 0);
    }

    #[test]
    fn test_zero_requested_rejected() {
        assert!(assemble_seeded(&single_topic(2), 0, 0)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_fisher_yates_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    fn thin_easy_selection() -> Selection {
        let mut pool = vec![
            Question::new("e1", "vocab", Difficulty::Easy),
            Question::new("e2", "vocab", Difficulty::Easy),
        ];
        pool.extend((0..8).map(|i| Question::new(format!("m{i}"), "vocab", Difficulty::Medium)));
        crate::selector::select(&TopicId::new("vocab"), 10.0, &pool, &HashSet::new()).unwrap()
    }

    #[test]
    fn test_short_quiz_keeps_only_on_target_questions() {
        let selection = thin_easy_selection();
        assert_eq!(selection.primary_count, 2);
        let candidates = candidates_from_selections([&selection]);

        for seed in 0..100 {
            let quiz = assemble_seeded(&candidates, 2, seed).unwrap();
            let mut ids: Vec<&str> = quiz.question_ids.iter().map(|id| id.as_str()).collect();
            ids.sort_unstable();
            assert_eq!(ids, ["e1", "e2"], "seed {seed}");
        }
    }

    #[test]
    fn test_widened_questions_fill_the_tail() {
        let candidates = candidates_from_selections([&thin_easy_selection()]);
        let quiz = assemble_seeded(&candidates, 5, 9).unwrap();
        assert_eq!(quiz.len(), 5);
        let head: HashSet<&str> = quiz.question_ids[..2].iter().map(|id| id.as_str()).collect();
        assert_eq!(head, HashSet::from(["e1", "e2"]));
        assert!(quiz.question_ids[2..]
            .iter()
            .all(|id| id.as_str().starts_with('m')));
    }

    #[test]
    fn test_primary_copy_wins_dedup() {
        let per_topic = BTreeMap::from([
            (
                TopicId::new("a"),
                TopicCandidates {
                    primary: vec![Question::new("x", "a", Difficulty::Hard)],
                    expanded: vec![Question::new("shared", "a", Difficulty::Medium)],
                },
            ),
            (
                TopicId::new("b"),
                TopicCandidates {
                    primary: vec![Question::new("shared", "b", Difficulty::Medium)],
                    expanded: vec![Question::new("y", "b", Difficulty::Easy)],
                },
            ),
        ]);
        let quiz = assemble_seeded(&per_topic, 2, 4).unwrap();
        let ids: HashSet<&str> = quiz.question_ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["x", "shared"]));
    }
}

//! Service-level properties over the in-memory store
//!
//! - Replay agreement: recording attempts one by one through the service
//!   yields the same concept record as replaying the history in prep-algo
//! - No lost updates: concurrent writers to one concept all land

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use prep_algo::{replay, AttemptOutcome, ConceptId, Difficulty, TopicId};
use prep_backend::config::PracticeConfig;
use prep_backend::seed::demo_catalog;
use prep_backend::services::PracticeService;
use prep_backend::store::InMemoryStore;

fn service(max_write_retries: u32) -> PracticeService {
    let config = PracticeConfig {
        max_write_retries,
        ..PracticeConfig::default()
    };
    PracticeService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(demo_catalog().unwrap()),
        config,
    )
}

fn outcome(minute: i64, correct: bool, concepts: BTreeSet<ConceptId>) -> AttemptOutcome {
    AttemptOutcome {
        timestamp: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minute),
        correct,
        topic_id: TopicId::new("advanced-math"),
        concept_ids: concepts,
        difficulty: Difficulty::Medium,
        question_id: None,
    }
}

fn arb_concepts() -> impl Strategy<Value = BTreeSet<ConceptId>> {
    prop::sample::subsequence(vec!["quadratics", "exponentials", "radicals"], 1..=3)
        .prop_map(|names| names.into_iter().map(ConceptId::new).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_service_matches_replay(
        attempts in prop::collection::vec((any::<bool>(), arb_concepts()), 1..40)
    ) {
        let service = service(3);
        let history: Vec<AttemptOutcome> = attempts
            .into_iter()
            .enumerate()
            .map(|(i, (correct, concepts))| outcome(i as i64, correct, concepts))
            .collect();

        for attempt in &history {
            service.record_attempt("learner", attempt).unwrap();
        }

        for name in ["quadratics", "exponentials", "radicals"] {
            let concept = ConceptId::new(name);
            let expected = replay(&concept, &history).unwrap();
            let stored = service.concept_mastery("learner", &concept).unwrap();
            prop_assert_eq!(stored, expected);
        }

        let progress = service
            .topic_progress("learner", &TopicId::new("advanced-math"))
            .unwrap()
            .unwrap();
        prop_assert_eq!(progress.total_questions_answered as usize, history.len());
    }
}

#[test]
fn test_concurrent_writers_lose_no_updates() {
    const WRITERS: i64 = 8;
    const ATTEMPTS_EACH: i64 = 25;

    // Generous retry budget: this checks that conflicts are resolved, not the bound
    let service = Arc::new(service(10_000));
    let concept = BTreeSet::from([ConceptId::new("quadratics")]);

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let service = Arc::clone(&service);
            let concept = concept.clone();
            thread::spawn(move || {
                for n in 0..ATTEMPTS_EACH {
                    let attempt = outcome(writer * ATTEMPTS_EACH + n, n % 4 != 0, concept.clone());
                    service.record_attempt("shared", &attempt).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let record = service
        .concept_mastery("shared", &ConceptId::new("quadratics"))
        .unwrap()
        .unwrap();
    let total = (WRITERS * ATTEMPTS_EACH) as u32;
    assert_eq!(record.questions_attempted, total);
    let correct_each = (0..ATTEMPTS_EACH).filter(|n| n % 4 != 0).count() as u32;
    assert_eq!(record.questions_correct, correct_each * WRITERS as u32);

    let progress = service
        .topic_progress("shared", &TopicId::new("advanced-math"))
        .unwrap()
        .unwrap();
    assert_eq!(progress.total_questions_answered, total);
}

use prep_algo::{Difficulty, Question, Section, TopicId};

use crate::catalog::{CatalogError, TopicCatalog, TopicDefinition};
use crate::store::InMemoryStore;

const QUESTIONS_PER_DIFFICULTY: usize = 6;

struct DemoTopic {
    id: &'static str,
    name: &'static str,
    section: Section,
    weight: f64,
}

const DEMO_TOPICS: &[DemoTopic] = &[
    DemoTopic {
        id: "information-and-ideas",
        name: "Information and Ideas",
        section: Section::ReadingWriting,
        weight: 26.0,
    },
    DemoTopic {
        id: "craft-and-structure",
        name: "Craft and Structure",
        section: Section::ReadingWriting,
        weight: 28.0,
    },
    DemoTopic {
        id: "expression-of-ideas",
        name: "Expression of Ideas",
        section: Section::ReadingWriting,
        weight: 20.0,
    },
    DemoTopic {
        id: "standard-english-conventions",
        name: "Standard English Conventions",
        section: Section::ReadingWriting,
        weight: 26.0,
    },
    DemoTopic {
        id: "algebra",
        name: "Algebra",
        section: Section::Math,
        weight: 35.0,
    },
    DemoTopic {
        id: "advanced-math",
        name: "Advanced Math",
        section: Section::Math,
        weight: 35.0,
    },
    DemoTopic {
        id: "problem-solving-data-analysis",
        name: "Problem-Solving and Data Analysis",
        section: Section::Math,
        weight: 15.0,
    },
    DemoTopic {
        id: "geometry-trigonometry",
        name: "Geometry and Trigonometry",
        section: Section::Math,
        weight: 15.0,
    },
];

/// Built-in catalog used when no catalog file is configured
pub fn demo_catalog() -> Result<TopicCatalog, CatalogError> {
    TopicCatalog::new(
        DEMO_TOPICS
            .iter()
            .map(|topic| TopicDefinition {
                topic_id: TopicId::new(topic.id),
                name: topic.name.to_string(),
                section: topic.section,
                weight: topic.weight,
            })
            .collect(),
    )
}

/// Question ids look like `algebra-h-03`
pub fn demo_questions(catalog: &TopicCatalog) -> Vec<Question> {
    let mut questions = Vec::with_capacity(catalog.len() * 3 * QUESTIONS_PER_DIFFICULTY);
    for topic in catalog.topics() {
        for difficulty in Difficulty::ALL {
            let tag = match difficulty {
                Difficulty::Easy => "e",
                Difficulty::Medium => "m",
                Difficulty::Hard => "h",
            };
            for n in 1..=QUESTIONS_PER_DIFFICULTY {
                questions.push(Question::new(
                    format!("{}-{tag}-{n:02}", topic.topic_id),
                    topic.topic_id.clone(),
                    difficulty,
                ));
            }
        }
    }
    questions
}

pub fn seed_demo_questions(store: &InMemoryStore, catalog: &TopicCatalog) {
    let questions = demo_questions(catalog);
    let count = questions.len();
    store.add_questions(questions);
    tracing::info!(topics = catalog.len(), questions = count, "seeded demo question pool");
}

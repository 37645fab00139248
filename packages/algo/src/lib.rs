//! # prep-algo - 自适应备考核心算法库
//!
//! Pure computations behind adaptive test-prep practice:
//!
//! - **Mastery Evaluator** - per-concept mastery state from attempt counters
//! - **Adaptive Difficulty Selector** - next difficulty and candidate pool per topic
//! - **Quiz Assembler** - deduplicated, shuffled, truncated practice sets
//! - **Proficiency Aggregator** - confidence-weighted composite score
//!
//! Every operation is a synchronous function of its inputs with no hidden
//! state, so computations for different learners can run in parallel freely.
//! Persistence, and serializing concurrent updates to the same record, belong
//! to the caller.
//!
//! ## 模块结构
//!
//! - [`mastery`] - concept mastery state machine
//! - [`progress`] - per-topic rolling results window
//! - [`selector`] - difficulty targeting and pool expansion
//! - [`assembler`] - quiz assembly (Fisher-Yates)
//! - [`proficiency`] - section and composite scoring
//! - [`sanitize`] - input validation
//! - [`types`] - shared types and constants
//!
//! ## 使用示例
//!
//! ```rust
//! use std::collections::HashSet;
//! use prep_algo::{assemble_seeded, candidates_from_selections, select, Difficulty, Question, TopicId};
//!
//! let topic = TopicId::new("algebra");
//! let pool = vec![
//!     Question::new("q1", "algebra", Difficulty::Medium),
//!     Question::new("q2", "algebra", Difficulty::Easy),
//! ];
//! let selection = select(&topic, 65.0, &pool, &HashSet::new()).unwrap();
//! let quiz = assemble_seeded(&candidates_from_selections([&selection]), 5, 42).unwrap();
//! assert_eq!(quiz.len(), 2);
//! assert!(quiz.under_filled);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod assembler;
pub mod error;
pub mod mastery;
pub mod proficiency;
pub mod progress;
pub mod sanitize;
pub mod selector;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use error::{EngineError, InsufficientData, Result};

pub use mastery::{classify, evaluate, evaluate_attempt, replay, MasterySummary};

pub use progress::record_result;

pub use selector::{select, target_difficulty, Selection};

pub use assembler::{
    assemble, assemble_seeded, candidates_from_selections, QuizSpec, TopicCandidates,
};

pub use proficiency::aggregate;

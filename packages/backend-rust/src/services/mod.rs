pub mod practice;

pub use practice::{
    AttemptReport, PracticeService, QuizPlan, QuizRequest, ServiceError, ServiceResult,
    TopicSelectionSummary,
};

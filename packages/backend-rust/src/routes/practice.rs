use std::collections::BTreeSet;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use prep_algo::{AttemptOutcome, ConceptId, Difficulty, QuestionId, TopicId};

use crate::response::AppError;
use crate::services::QuizRequest;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordAttemptRequest {
    /// Defaults to the time the request is received
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    correct: bool,
    topic_id: TopicId,
    concept_ids: BTreeSet<ConceptId>,
    difficulty: Difficulty,
    #[serde(default)]
    question_id: Option<QuestionId>,
}

impl RecordAttemptRequest {
    fn into_outcome(self) -> AttemptOutcome {
        AttemptOutcome {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            correct: self.correct,
            topic_id: self.topic_id,
            concept_ids: self.concept_ids,
            difficulty: self.difficulty,
            question_id: self.question_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildQuizRequest {
    topic_ids: Vec<TopicId>,
    requested_count: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConceptMasteryResponse<T> {
    concept_id: ConceptId,
    record: Option<T>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id/attempts", post(record_attempt))
        .route("/:user_id/concepts/:concept_id", get(concept_mastery))
        .route("/:user_id/mastery/summary", get(mastery_summary))
        .route("/:user_id/topics/:topic_id/progress", get(topic_progress))
        .route("/:user_id/quizzes", post(build_quiz))
        .route("/:user_id/score", get(score_estimate))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|err| AppError::validation(format!("invalid request body: {err}")))
}

fn user_id(raw: &str) -> Result<&str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("userId must not be empty"));
    }
    Ok(trimmed)
}

async fn record_attempt(
    State(state): State<AppState>,
    Path(raw_user): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let user = user_id(&raw_user)?;
    let payload: RecordAttemptRequest = parse_body(&body)?;
    let report = state
        .practice()
        .record_attempt(user, &payload.into_outcome())?;

    Ok(Json(SuccessResponse {
        success: true,
        data: report,
    }))
}

async fn concept_mastery(
    State(state): State<AppState>,
    Path((raw_user, concept_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_id(&raw_user)?;
    let concept_id = ConceptId::new(concept_id.trim());
    let record = state.practice().concept_mastery(user, &concept_id)?;

    Ok(Json(SuccessResponse {
        success: true,
        data: ConceptMasteryResponse { concept_id, record },
    }))
}

async fn mastery_summary(
    State(state): State<AppState>,
    Path(raw_user): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_id(&raw_user)?;
    let summary = state.practice().mastery_summary(user)?;
    Ok(Json(SuccessResponse {
        success: true,
        data: summary,
    }))
}

async fn topic_progress(
    State(state): State<AppState>,
    Path((raw_user, topic_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_id(&raw_user)?;
    let progress = state
        .practice()
        .topic_progress(user, &TopicId::new(topic_id.trim()))?;
    Ok(Json(SuccessResponse {
        success: true,
        data: progress,
    }))
}

async fn build_quiz(
    State(state): State<AppState>,
    Path(raw_user): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let user = user_id(&raw_user)?;
    let payload: BuildQuizRequest = parse_body(&body)?;
    let plan = state.practice().build_quiz(
        user,
        &QuizRequest {
            topic_ids: payload.topic_ids,
            requested_count: payload.requested_count,
            seed: payload.seed,
        },
    )?;

    Ok(Json(SuccessResponse {
        success: true,
        data: plan,
    }))
}

async fn score_estimate(
    State(state): State<AppState>,
    Path(raw_user): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_id(&raw_user)?;
    let estimate = state.practice().score_estimate(user)?;
    Ok(Json(SuccessResponse {
        success: true,
        data: estimate,
    }))
}

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::catalog::TopicDefinition;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicListResponse<'a> {
    total: usize,
    topics: &'a [TopicDefinition],
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_topics))
}

async fn list_topics(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog();
    Json(SuccessResponse {
        success: true,
        data: TopicListResponse {
            total: catalog.len(),
            topics: catalog.topics(),
        },
    })
    .into_response()
}

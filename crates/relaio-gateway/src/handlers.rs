// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the admin REST surface.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use relaio_core::RelaioError;
use relaio_core::types::{MessageView, ThreadId};
use relaio_storage::ThreadSummary;

use crate::server::GatewayState;

/// Actor key for REST-initiated repair operations.
const API_ACTOR: &str = "admin-api";

/// Response item for `GET /api/threads`.
#[derive(Debug, Serialize)]
pub struct ThreadItem {
    pub id: String,
    pub display_name: String,
    pub created_at: String,
    pub last_activity_at: String,
    pub last_message: Option<String>,
    pub last_message_time: Option<String>,
}

impl From<ThreadSummary> for ThreadItem {
    fn from(summary: ThreadSummary) -> Self {
        Self {
            id: summary.id.0,
            display_name: summary.display_name,
            created_at: summary.created_at,
            last_activity_at: summary.last_activity_at,
            last_message: summary.last_message,
            last_message_time: summary.last_message_time,
        }
    }
}

/// Query parameters for `GET /api/messages`.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub thread_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    relaio_relay::orchestrator::DEFAULT_PAGE_SIZE
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/threads
pub async fn get_threads(State(state): State<GatewayState>) -> Response {
    match state.relay.list_threads().await {
        Ok(summaries) => {
            let items: Vec<ThreadItem> = summaries.into_iter().map(ThreadItem::from).collect();
            Json(items).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// GET /api/messages?thread_id=...&limit=...
pub async fn get_messages(
    State(state): State<GatewayState>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    let thread_id = ThreadId(query.thread_id);
    match state.relay.thread_messages(&thread_id, query.limit).await {
        Ok(messages) => Json::<Vec<MessageView>>(messages).into_response(),
        Err(err) => error_response(err),
    }
}

/// POST /api/threads/{id}/purge
pub async fn post_purge_thread(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    let thread_id = ThreadId(id);
    match state.relay.purge_thread(API_ACTOR, &thread_id).await {
        Ok(()) => Json(serde_json::json!({"success": true})).into_response(),
        Err(err) => error_response(err),
    }
}

/// POST /api/purge_all
pub async fn post_purge_all(State(state): State<GatewayState>) -> Response {
    match state.relay.purge_all(API_ACTOR).await {
        Ok(()) => Json(serde_json::json!({"success": true})).into_response(),
        Err(err) => error_response(err),
    }
}

/// Map relay errors onto HTTP statuses.
fn error_response(err: RelaioError) -> Response {
    let status = match &err {
        RelaioError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
        RelaioError::Validation(_) => StatusCode::BAD_REQUEST,
        RelaioError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

// POST /api/messages/delete
#[derive(Deserialize)]
pub struct DeleteMessagesRequest {
    pub user_id: Option<String>,
}

pub async fn delete_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DeleteMessagesRequest>,
) -> Result<Json<Value>, AppError> {
    auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let user_id = body
        .user_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("User ID is required".to_string()))?;

    let mut db = state.db.lock().unwrap();

    // History and session state go together so the bot restarts clean.
    let tx = db.transaction()?;
    let deleted = queries::delete_user_messages(&tx, user_id)?;
    queries::delete_user_sessions(&tx, user_id)?;
    tx.commit()?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully deleted {deleted} messages"),
        "deletedCount": deleted,
    })))
}

// GET /api/messages/count/:user_id
pub async fn count_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let db = state.db.lock().unwrap();
    let count = queries::count_user_messages(&db, &user_id)?;

    Ok(Json(json!({
        "success": true,
        "messageCount": count,
    })))
}

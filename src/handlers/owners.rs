use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{self, Subject};
use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

// POST /api/owners/add
#[derive(Deserialize)]
pub struct AddOwnerRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub property_ids: Option<Vec<String>>,
}

pub async fn add_owner(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddOwnerRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (username, password) = match (body.username.as_deref(), body.password.as_deref()) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ))
        }
    };

    let db = state.db.lock().unwrap();

    if queries::get_owner_by_username(&db, username)?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;

    let owner_id = Uuid::new_v4().to_string();
    queries::create_owner(&db, &owner_id, body.name.as_deref(), username, &password_hash)?;

    if let Some(property_ids) = &body.property_ids {
        for property_id in property_ids {
            if queries::get_property(&db, property_id)?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Property {property_id} not found"
                )));
            }
            queries::link_owner_property(&db, &owner_id, property_id)?;
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Owner created successfully",
            "owner": {
                "owner_id": owner_id,
                "username": username,
            },
        })),
    ))
}

// POST /api/owners/login
#[derive(Deserialize)]
pub struct OwnerLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OwnerLoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (username, password) = match (body.username.as_deref(), body.password.as_deref()) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ))
        }
    };

    let db = state.db.lock().unwrap();

    let owner = queries::get_owner_by_username(&db, username)?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !bcrypt::verify(password, &owner.password).unwrap_or(false) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = auth::issue_token(
        &Subject::Owner {
            owner_id: owner.owner_id.clone(),
            username: owner.username.clone(),
        },
        &state.config.jwt_secret,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "owner": {
            "owner_id": owner.owner_id,
            "name": owner.name,
            "username": owner.username,
        },
    })))
}

// GET /api/owners/properties
pub async fn properties(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let owner_id = match auth::bearer_subject(&headers, &state.config.jwt_secret)? {
        Subject::Owner { owner_id, .. } => owner_id,
        _ => {
            return Err(AppError::Forbidden(
                "Forbidden - Owner access required".to_string(),
            ))
        }
    };

    let db = state.db.lock().unwrap();
    let properties = queries::get_properties_for_owner(&db, &owner_id)?;

    Ok(Json(json!({
        "message": "Properties retrieved successfully",
        "properties": properties,
    })))
}

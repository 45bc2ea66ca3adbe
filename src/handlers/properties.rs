use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{self, Subject};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Property, PropertyType, ShiftPrice, ShiftType};
use crate::services::scope::{self, PropertyScope};
use crate::state::AppState;

const DAYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

// POST /api/properties/login
#[derive(Deserialize)]
pub struct PropertyLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PropertyLoginRequest>,
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

    let property = queries::get_property_by_username(&db, username)?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !bcrypt::verify(password, &property.password).unwrap_or(false) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = auth::issue_token(
        &Subject::Property {
            property_id: property.property_id.clone(),
            username: property.username.clone(),
        },
        &state.config.jwt_secret,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "property": {
            "property_id": property.property_id,
            "name": property.name,
            "username": property.username,
        },
    })))
}

// POST /api/properties/add
#[derive(Deserialize)]
pub struct AddPropertyRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub contact_no: Option<String>,
    pub max_occupancy: Option<i64>,
    pub property_type: Option<String>,
    pub advance_percentage: Option<f64>,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn add_property(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddPropertyRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (name, type_str, username, password) = match (
        body.name.as_deref(),
        body.property_type.as_deref(),
        body.username.as_deref(),
        body.password.as_deref(),
    ) {
        (Some(n), Some(t), Some(u), Some(p))
            if !n.is_empty() && !t.is_empty() && !u.is_empty() && !p.is_empty() =>
        {
            (n, t, u, p)
        }
        _ => {
            return Err(AppError::Validation(
                "Missing required fields: name, property_type, username, password".to_string(),
            ))
        }
    };

    let property_type = PropertyType::parse(type_str).ok_or_else(|| {
        AppError::Validation("Invalid property_type. Must be \"hut\" or \"farm\"".to_string())
    })?;

    let db = state.db.lock().unwrap();

    if queries::get_property_by_username(&db, username)?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;

    let property = Property {
        property_id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        address: body.address.clone(),
        city: body.city.clone(),
        province: body.province.clone(),
        country: body.country.clone(),
        contact_no: body.contact_no.clone(),
        max_occupancy: body.max_occupancy,
        property_type,
        advance_percentage: body.advance_percentage,
        username: username.to_string(),
        password: password_hash,
        created_at: queries::now_ts(),
    };
    queries::create_property(&db, &property)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Property added successfully",
            "property": property,
        })),
    ))
}

// POST /api/properties/edit
#[derive(Deserialize)]
pub struct EditPropertyRequest {
    pub property_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub contact_no: Option<String>,
    pub max_occupancy: Option<i64>,
    pub property_type: Option<String>,
    pub advance_percentage: Option<f64>,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn edit_property(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<EditPropertyRequest>,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let db = state.db.lock().unwrap();

    let property_id = match scope::resolve_property_scope(&db, &subject, body.property_id.as_deref())? {
        PropertyScope::Exact(id) => id,
        PropertyScope::OwnerAll(_) => {
            return Err(AppError::Validation("Property ID is required".to_string()))
        }
    };

    let mut property = queries::get_property(&db, &property_id)?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    // Absent fields keep their current values.
    if let Some(name) = body.name {
        property.name = name;
    }
    if let Some(address) = body.address {
        property.address = Some(address);
    }
    if let Some(city) = body.city {
        property.city = Some(city);
    }
    if let Some(province) = body.province {
        property.province = Some(province);
    }
    if let Some(country) = body.country {
        property.country = Some(country);
    }
    if let Some(contact_no) = body.contact_no {
        property.contact_no = Some(contact_no);
    }
    if let Some(max_occupancy) = body.max_occupancy {
        property.max_occupancy = Some(max_occupancy);
    }
    if let Some(advance_percentage) = body.advance_percentage {
        property.advance_percentage = Some(advance_percentage);
    }
    if let Some(type_str) = body.property_type.as_deref() {
        property.property_type = PropertyType::parse(type_str).ok_or_else(|| {
            AppError::Validation("Invalid property_type. Must be \"hut\" or \"farm\"".to_string())
        })?;
    }
    if let Some(username) = body.username {
        if username != property.username
            && queries::get_property_by_username(&db, &username)?.is_some()
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        property.username = username;
    }
    if let Some(password) = body.password.as_deref() {
        property.password = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;
    }

    queries::update_property(&db, &property)?;

    Ok(Json(json!({
        "message": "Property updated successfully",
        "property": property,
    })))
}

#[derive(Deserialize)]
pub struct PropertyQuery {
    pub property_id: Option<String>,
}

// GET /api/properties/
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let db = state.db.lock().unwrap();

    let property_id = match scope::resolve_property_scope(&db, &subject, query.property_id.as_deref())? {
        PropertyScope::Exact(id) => id,
        PropertyScope::OwnerAll(_) => {
            return Err(AppError::Validation("Property ID is required".to_string()))
        }
    };

    let property = queries::get_property(&db, &property_id)?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    Ok(Json(json!({ "property": property })))
}

// POST /api/properties/edit/pricing
#[derive(Deserialize)]
pub struct ShiftPriceInput {
    pub day_of_week: String,
    pub shift_type: String,
    pub price: f64,
}

#[derive(Deserialize)]
pub struct EditPricingRequest {
    pub property_id: Option<String>,
    pub season_start: Option<String>,
    pub season_end: Option<String>,
    pub special_offer: Option<String>,
    pub shift_prices: Option<Vec<ShiftPriceInput>>,
}

pub async fn edit_pricing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<EditPricingRequest>,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let shift_prices = body
        .shift_prices
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Validation("shift_prices must be a non-empty array".to_string())
        })?;

    for sp in shift_prices {
        if !DAYS.contains(&sp.day_of_week.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid day_of_week: {}",
                sp.day_of_week
            )));
        }
        if ShiftType::parse(&sp.shift_type).is_none() {
            return Err(AppError::Validation(format!(
                "Invalid shift_type: {}",
                sp.shift_type
            )));
        }
        if sp.price < 0.0 {
            return Err(AppError::Validation(
                "Price must be a non-negative number".to_string(),
            ));
        }
    }

    let season_start = body
        .season_start
        .as_deref()
        .map(|s| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                AppError::Validation("Invalid season_start format. Use YYYY-MM-DD".to_string())
            })
        })
        .transpose()?;
    let season_end = body
        .season_end
        .as_deref()
        .map(|s| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                AppError::Validation("Invalid season_end format. Use YYYY-MM-DD".to_string())
            })
        })
        .transpose()?;

    let mut db = state.db.lock().unwrap();

    let property_id = match scope::resolve_property_scope(&db, &subject, body.property_id.as_deref())? {
        PropertyScope::Exact(id) => id,
        PropertyScope::OwnerAll(_) => {
            return Err(AppError::Validation("Property ID is required".to_string()))
        }
    };

    // Replace the whole pricing table for the property in one shot.
    let pricing_id = Uuid::new_v4().to_string();
    let tx = db.transaction()?;
    queries::delete_pricing_for_property(&tx, &property_id)?;
    queries::insert_pricing(
        &tx,
        &pricing_id,
        &property_id,
        season_start.as_ref(),
        season_end.as_ref(),
        body.special_offer.as_deref(),
    )?;
    for sp in shift_prices {
        queries::insert_shift_price(
            &tx,
            &pricing_id,
            &ShiftPrice {
                day_of_week: sp.day_of_week.clone(),
                shift_type: sp.shift_type.clone(),
                price: sp.price,
            },
        )?;
    }
    tx.commit()?;

    Ok(Json(json!({
        "message": "Pricing updated successfully",
        "pricing_id": pricing_id,
    })))
}

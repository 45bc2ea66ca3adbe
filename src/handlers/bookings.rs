use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, BookingWithUser};
use crate::services::bookings::{self, CreateBooking};
use crate::services::notify::StatusChangeEvent;
use crate::services::scope::{self, PropertyScope};
use crate::state::AppState;

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn booking_json(b: &Booking) -> Value {
    json!({
        "booking_id": b.booking_id,
        "user_id": b.user_id,
        "property_id": b.property_id,
        "booking_date": b.booking_date.format("%Y-%m-%d").to_string(),
        "shift_type": b.shift_type.as_str(),
        "total_cost": b.total_cost,
        "booking_source": b.booking_source.as_str(),
        "status": b.status.as_str(),
        "payment_screenshot_url": b.payment_screenshot_url,
        "booked_at": b.booked_at.format(TS_FMT).to_string(),
        "created_at": b.created_at.format(TS_FMT).to_string(),
        "updated_at": b.updated_at.format(TS_FMT).to_string(),
    })
}

fn booking_with_user_json(bu: &BookingWithUser) -> Value {
    let mut v = booking_json(&bu.booking);
    v["user_name"] = json!(bu.user_name);
    v["user_phone_number"] = json!(bu.user_phone_number);
    v["user_cnic"] = json!(bu.user_cnic);
    v["user_email"] = json!(bu.user_email);
    v
}

#[derive(Deserialize)]
pub struct ScopeQuery {
    pub property_id: Option<String>,
}

// POST /api/bookings/create
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub cnic: Option<String>,
    pub phone_no: Option<String>,
    pub name: Option<String>,
    pub booking_date: Option<String>,
    pub shift_type: Option<String>,
    pub booking_source: Option<String>,
    pub property_id: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ScopeQuery>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let mut db = state.db.lock().unwrap();

    let explicit = query.property_id.as_deref().or(body.property_id.as_deref());
    let property_id = match scope::resolve_property_scope(&db, &subject, explicit)? {
        PropertyScope::Exact(id) => id,
        PropertyScope::OwnerAll(_) => {
            return Err(AppError::Validation(
                "Property ID is required for creating bookings".to_string(),
            ))
        }
    };

    let missing = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
    if missing(&body.cnic)
        || missing(&body.phone_no)
        || missing(&body.name)
        || missing(&body.booking_date)
        || missing(&body.shift_type)
    {
        return Err(AppError::Validation(
            "Missing required fields: cnic, phone_no, name, property_id, booking_date, shift_type, booking_source"
                .to_string(),
        ));
    }

    let req = CreateBooking {
        cnic: body.cnic.unwrap_or_default(),
        phone_no: body.phone_no.unwrap_or_default(),
        name: body.name.unwrap_or_default(),
        booking_date: body.booking_date.unwrap_or_default(),
        shift_type: body.shift_type.unwrap_or_default(),
        booking_source: body.booking_source,
    };

    let created = bookings::create_booking(&mut db, &property_id, &req)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully",
            "booking": {
                "booking_id": created.booking.booking_id,
                "user_id": created.booking.user_id,
                "user_cnic": created.user_cnic,
                "user_phone_no": created.user_phone_number,
                "user_name": created.user_name,
                "property_id": created.booking.property_id,
                "booking_date": created.booking.booking_date.format("%Y-%m-%d").to_string(),
                "shift_type": created.booking.shift_type.as_str(),
                "total_cost": created.booking.total_cost,
                "booking_source": created.booking.booking_source.as_str(),
                "status": created.booking.status.as_str(),
                "booked_at": created.booking.booked_at.format(TS_FMT).to_string(),
                "created_at": created.booking.created_at.format(TS_FMT).to_string(),
                "updated_at": created.booking.updated_at.format(TS_FMT).to_string(),
            },
        })),
    ))
}

// GET /api/bookings/
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let db = state.db.lock().unwrap();

    let scope = scope::resolve_property_scope(&db, &subject, query.property_id.as_deref())?;
    let property_ids = scope::scope_property_ids(&db, &scope)?;

    if property_ids.is_empty() {
        return Ok(Json(json!({
            "message": "No bookings found",
            "bookings": [],
        })));
    }

    let listed = bookings::list_bookings(&db, &property_ids)?;

    Ok(Json(json!({
        "message": "Bookings retrieved successfully",
        "bookings": listed.iter().map(booking_with_user_json).collect::<Vec<_>>(),
    })))
}

// POST /api/bookings/confirm and /api/bookings/cancel
#[derive(Deserialize)]
pub struct TransitionRequest {
    pub booking_id: Option<String>,
    pub property_id: Option<String>,
}

async fn transition(
    state: Arc<AppState>,
    headers: HeaderMap,
    body: TransitionRequest,
    target: BookingStatus,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let booking_id = body
        .booking_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Validation("Missing required field: booking_id".to_string())
        })?;

    let mut db = state.db.lock().unwrap();

    let scope = scope::resolve_property_scope(&db, &subject, body.property_id.as_deref())?;
    let property_ids = scope::scope_property_ids(&db, &scope)?;

    let booking = bookings::transition_booking(&mut db, &property_ids, booking_id, target)?;

    Ok(Json(json!({
        "message": format!("Booking {} successfully", target.as_str().to_lowercase()),
        "booking": booking_json(&booking),
    })))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    transition(state, headers, body, BookingStatus::Confirmed).await
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    transition(state, headers, body, BookingStatus::Cancelled).await
}

// POST /api/bookings/complete
#[derive(Deserialize, Default)]
pub struct CompleteRequest {
    pub property_id: Option<String>,
}

pub async fn complete_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ScopeQuery>,
    body: Option<Json<CompleteRequest>>,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let mut db = state.db.lock().unwrap();

    let explicit = query.property_id.as_deref().or(body.property_id.as_deref());
    let scope = scope::resolve_property_scope(&db, &subject, explicit)?;
    let property_ids = scope::scope_property_ids(&db, &scope)?;

    if property_ids.is_empty() {
        return Ok(Json(json!({
            "message": "No properties found for this owner",
            "completedCount": 0,
        })));
    }

    let completed = bookings::complete_past_bookings(&mut db, &property_ids)?;

    if completed.is_empty() {
        return Ok(Json(json!({
            "message": "No eligible bookings found to mark as completed",
            "bookings": [],
        })));
    }

    Ok(Json(json!({
        "message": format!("Successfully marked {} booking(s) as completed", completed.len()),
        "bookings": completed.iter().map(booking_json).collect::<Vec<_>>(),
    })))
}

// POST /api/bookings/update-status and /api/bookings/update-status-local
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub booking_id: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub force: bool,
    pub property_id: Option<String>,
}

async fn update_status_inner(
    state: Arc<AppState>,
    headers: HeaderMap,
    body: UpdateStatusRequest,
    notify: bool,
) -> Result<Json<Value>, AppError> {
    let subject = auth::bearer_subject(&headers, &state.config.jwt_secret)?;

    let (booking_id, status_str) = match (body.booking_id.as_deref(), body.status.as_deref()) {
        (Some(b), Some(s)) if !b.is_empty() && !s.is_empty() => (b, s),
        _ => {
            return Err(AppError::Validation(
                "Missing required fields: booking_id, status".to_string(),
            ))
        }
    };

    let status = BookingStatus::parse(status_str).ok_or_else(|| {
        AppError::Validation(
            "Invalid status. Must be one of: Pending, Confirmed, Cancelled, Completed".to_string(),
        )
    })?;

    let updated = {
        let mut db = state.db.lock().unwrap();
        let scope = scope::resolve_property_scope(&db, &subject, body.property_id.as_deref())?;
        let property_ids = scope::scope_property_ids(&db, &scope)?;
        bookings::update_booking_status(&mut db, &property_ids, booking_id, status, body.force)?
    };

    // Post-commit and best effort; the local variant skips it entirely.
    if notify {
        let _ = state.notify_tx.send(StatusChangeEvent {
            booking_id: updated.booking.booking_id.clone(),
            user_id: updated.booking.user_id.clone(),
            status,
        });
    }

    Ok(Json(json!({
        "message": format!("Booking status updated to {} successfully", status.as_str()),
        "booking": booking_with_user_json(&updated),
    })))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    update_status_inner(state, headers, body, true).await
}

pub async fn update_status_local(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    update_status_inner(state, headers, body, false).await
}

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Subject};
use crate::db::queries::{self, AdminBookingRow};
use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::notify::StatusChangeEvent;
use crate::state::AppState;

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

// POST /api/admin/login
#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdminLoginRequest>,
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

    let admin = queries::get_admin_by_username(&db, username)?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !bcrypt::verify(password, &admin.password).unwrap_or(false) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = auth::issue_token(
        &Subject::Admin {
            admin_id: admin.admin_id.clone(),
            username: admin.username.clone(),
        },
        &state.config.jwt_secret,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "admin": {
            "admin_id": admin.admin_id,
            "username": admin.username,
        },
    })))
}

fn admin_booking_json(row: &AdminBookingRow) -> Value {
    let b = &row.booking.booking;
    json!({
        "booking_id": b.booking_id,
        "status": b.status.as_str(),
        "booking_date": b.booking_date.format("%Y-%m-%d").to_string(),
        "shift_type": b.shift_type.as_str(),
        "total_cost": b.total_cost,
        "booking_source": b.booking_source.as_str(),
        "payment_screenshot_url": b.payment_screenshot_url,
        "booked_at": b.booked_at.format(TS_FMT).to_string(),
        "user_id": b.user_id,
        "user_name": row.booking.user_name.as_deref().unwrap_or("N/A"),
        "user_email": row.booking.user_email.as_deref().unwrap_or("N/A"),
        "user_phone_number": row.booking.user_phone_number.as_deref().unwrap_or("N/A"),
        "user_cnic": row.booking.user_cnic.as_deref().unwrap_or("N/A"),
        "property_name": row.property_name.as_deref().unwrap_or("N/A"),
        "property_address": row.property_address.as_deref().unwrap_or("N/A"),
        "property_city": row.property_city.as_deref().unwrap_or("N/A"),
    })
}

// GET /api/admin/bookings?status=&page=&limit=
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Value>, AppError> {
    auth::bearer_admin(&headers, &state.config.jwt_secret)?;

    let status_filter = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(BookingStatus::parse(s).ok_or_else(|| {
            AppError::Validation(
                "Invalid status. Must be one of: Pending, Confirmed, Cancelled, Completed"
                    .to_string(),
            )
        })?),
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = (page - 1) * limit;

    let db = state.db.lock().unwrap();

    let rows = queries::get_bot_bookings(&db, status_filter, limit, offset)?;
    let total = queries::count_bot_bookings(&db, status_filter)?;
    let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

    Ok(Json(json!({
        "bookings": rows.iter().map(admin_booking_json).collect::<Vec<_>>(),
        "pagination": {
            "total": total,
            "page": page,
            "limit": limit,
            "totalPages": total_pages,
        },
    })))
}

// POST /api/admin/bookings/update-status
#[derive(Deserialize)]
pub struct AdminUpdateStatusRequest {
    pub booking_id: Option<String>,
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AdminUpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    auth::bearer_admin(&headers, &state.config.jwt_secret)?;

    let (booking_id, status_str) = match (body.booking_id.as_deref(), body.status.as_deref()) {
        (Some(b), Some(s)) if !b.is_empty() && !s.is_empty() => (b, s),
        _ => {
            return Err(AppError::Validation(
                "Booking ID and status are required".to_string(),
            ))
        }
    };

    let status = BookingStatus::parse(status_str).ok_or_else(|| {
        AppError::Validation(
            "Invalid status. Must be one of: Pending, Confirmed, Cancelled, Completed".to_string(),
        )
    })?;

    let booking = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_bot_booking(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound("Booking not found or not accessible".to_string()))?;
        queries::set_booking_status(&db, booking_id, status)?;
        booking
    };

    let _ = state.notify_tx.send(StatusChangeEvent {
        booking_id: booking.booking_id.clone(),
        user_id: booking.user_id.clone(),
        status,
    });

    Ok(Json(json!({
        "message": "Booking status updated successfully",
        "booking": {
            "booking_id": booking.booking_id,
            "status": status.as_str(),
        },
    })))
}

// GET /api/admin/dashboard/stats
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    auth::bearer_admin(&headers, &state.config.jwt_secret)?;

    let db = state.db.lock().unwrap();

    let total = queries::count_bot_bookings(&db, None)?;
    let pending = queries::count_bot_bookings(&db, Some(BookingStatus::Pending))?;
    let confirmed = queries::count_bot_bookings(&db, Some(BookingStatus::Confirmed))?;
    let completed = queries::count_bot_bookings(&db, Some(BookingStatus::Completed))?;
    let cancelled = queries::count_bot_bookings(&db, Some(BookingStatus::Cancelled))?;

    Ok(Json(json!({
        "stats": {
            "total": total,
            "pending": pending,
            "confirmed": confirmed,
            "completed": completed,
            "cancelled": cancelled,
        },
    })))
}

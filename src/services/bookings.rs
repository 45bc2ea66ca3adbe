use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingSource, BookingStatus, BookingWithUser, ShiftType};
use crate::services::pricing;

const DATE_FMT: &str = "%Y-%m-%d";

pub struct CreateBooking {
    pub cnic: String,
    pub phone_no: String,
    pub name: String,
    pub booking_date: String,
    pub shift_type: String,
    pub booking_source: Option<String>,
}

/// Strip dashes, then require exactly 13 digits.
pub fn normalize_cnic(cnic: &str) -> Result<String, AppError> {
    let clean: String = cnic.chars().filter(|c| *c != '-').collect();
    if clean.len() != 13 || !clean.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Invalid CNIC format. Must be 13 digits (with or without dashes)".to_string(),
        ));
    }
    Ok(clean)
}

/// 10-15 digits with an optional leading `+`.
pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.len() < 10 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Invalid phone number format. Must be 10-15 digits (optional + prefix)".to_string(),
        ));
    }
    Ok(())
}

/// Deterministic id: normalized name + ISO date + shift. Collisions across
/// customers sharing a name, date and shift are treated as "already exists".
pub fn derive_booking_id(name: &str, date: &NaiveDate, shift_type: ShiftType) -> String {
    let formatted_name = name.split_whitespace().collect::<Vec<_>>().join("_");
    format!(
        "{formatted_name}-{}-{}",
        date.format(DATE_FMT),
        shift_type.as_str()
    )
}

pub fn create_booking(
    conn: &mut Connection,
    property_id: &str,
    req: &CreateBooking,
) -> Result<BookingWithUser, AppError> {
    let cnic = normalize_cnic(&req.cnic)?;
    validate_phone(&req.phone_no)?;

    let name = req.name.trim();
    if name.is_empty() || req.name.len() > 255 {
        return Err(AppError::Validation(
            "Invalid name format. Must be a non-empty string up to 255 characters".to_string(),
        ));
    }

    let shift_type = ShiftType::parse(&req.shift_type).ok_or_else(|| {
        AppError::Validation(
            "Invalid shift_type. Must be \"Day\", \"Night\", \"Full Day\", or \"Full Night\""
                .to_string(),
        )
    })?;

    let booking_source = match req.booking_source.as_deref() {
        None | Some("") => BookingSource::Website,
        Some(s) => BookingSource::parse(s).ok_or_else(|| {
            AppError::Validation(
                "Invalid booking_source. Must be \"Website\", \"WhatsApp Bot\", or \"Third-Party\""
                    .to_string(),
            )
        })?,
    };

    let booking_date = NaiveDate::parse_from_str(&req.booking_date, DATE_FMT).map_err(|_| {
        AppError::Validation(
            "Invalid booking_date format. Use ISO format (e.g., \"2025-07-23\")".to_string(),
        )
    })?;

    let booking_id = derive_booking_id(name, &booking_date, shift_type);

    let tx = conn.transaction()?;

    if queries::get_booking_by_id(&tx, &booking_id)?.is_some() {
        return Err(AppError::Conflict(format!(
            "Booking ID {booking_id} already exists"
        )));
    }

    if queries::get_property(&tx, property_id)?.is_none() {
        return Err(AppError::NotFound("Property not found".to_string()));
    }

    // Fast path; the unique index on (property_id, booking_date, shift_type)
    // is the authoritative guard.
    if queries::slot_taken(&tx, property_id, &booking_date, shift_type)? {
        return Err(AppError::Conflict(
            "Property is already booked for this date and shift".to_string(),
        ));
    }

    let user = match queries::get_user_by_cnic(&tx, &cnic)? {
        Some(user) => user,
        None => {
            let user_id = Uuid::new_v4().to_string();
            queries::create_booking_user(&tx, &user_id, &cnic, &req.phone_no, name)?;
            queries::get_user_by_cnic(&tx, &cnic)?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user row vanished")))?
        }
    };

    let total_cost = pricing::resolve_price(&tx, property_id, &booking_date, shift_type)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        booking_id,
        user_id: Some(user.user_id.clone()),
        property_id: property_id.to_string(),
        booking_date,
        shift_type,
        total_cost,
        booking_source,
        status: BookingStatus::Pending,
        payment_screenshot_url: None,
        booked_at: now,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = queries::insert_booking(&tx, &booking) {
        if let Some(rusqlite::Error::SqliteFailure(err, _)) = e.downcast_ref::<rusqlite::Error>() {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return Err(AppError::Conflict(
                    "Property is already booked for this date and shift".to_string(),
                ));
            }
        }
        return Err(AppError::Internal(e));
    }

    tx.commit()?;

    Ok(BookingWithUser {
        booking,
        user_name: user.name,
        user_phone_number: user.phone_number,
        user_cnic: user.cnic,
        user_email: user.email,
    })
}

pub fn list_bookings(
    conn: &Connection,
    property_ids: &[String],
) -> Result<Vec<BookingWithUser>, AppError> {
    Ok(queries::get_bookings_for_properties(conn, property_ids)?)
}

/// Shared body of the guarded confirm/cancel endpoints: scoped fetch,
/// same-state rejection, transactional stamp.
pub fn transition_booking(
    conn: &mut Connection,
    property_ids: &[String],
    booking_id: &str,
    target: BookingStatus,
) -> Result<Booking, AppError> {
    if property_ids.is_empty() {
        return Err(AppError::Forbidden(
            "No properties found for this owner".to_string(),
        ));
    }

    let tx = conn.transaction()?;

    let mut booking = queries::get_booking_scoped(&tx, booking_id, property_ids)?.ok_or_else(
        || AppError::NotFound("Booking not found or not associated with this property".to_string()),
    )?;

    if booking.status == target {
        return Err(AppError::Validation(format!(
            "Booking is already {}",
            target.as_str().to_lowercase()
        )));
    }

    let updated_at = queries::set_booking_status(&tx, booking_id, target)?;
    tx.commit()?;

    booking.status = target;
    booking.updated_at = updated_at;
    Ok(booking)
}

/// Sweep every confirmed booking in scope whose date has passed to
/// Completed. An empty sweep is a success, and rerunning it is a no-op.
pub fn complete_past_bookings(
    conn: &mut Connection,
    property_ids: &[String],
) -> Result<Vec<Booking>, AppError> {
    if property_ids.is_empty() {
        return Ok(vec![]);
    }

    let today = Utc::now().date_naive();
    let tx = conn.transaction()?;

    let eligible = queries::get_confirmed_past_bookings(&tx, property_ids, &today)?;
    if eligible.is_empty() {
        tx.commit()?;
        return Ok(vec![]);
    }

    let mut completed = Vec::with_capacity(eligible.len());
    for mut booking in eligible {
        let updated_at = queries::set_booking_status(&tx, &booking.booking_id, BookingStatus::Completed)?;
        booking.status = BookingStatus::Completed;
        booking.updated_at = updated_at;
        completed.push(booking);
    }

    tx.commit()?;
    Ok(completed)
}

/// Generic status reassignment. Without `force` the transition must follow
/// the status graph; `force` is the admin-dashboard escape hatch that may
/// set anything, including re-stamping the current status.
pub fn update_booking_status(
    conn: &mut Connection,
    property_ids: &[String],
    booking_id: &str,
    target: BookingStatus,
    force: bool,
) -> Result<BookingWithUser, AppError> {
    if property_ids.is_empty() {
        return Err(AppError::Forbidden(
            "No properties found for this owner".to_string(),
        ));
    }

    let tx = conn.transaction()?;

    let booking = queries::get_booking_scoped(&tx, booking_id, property_ids)?.ok_or_else(
        || AppError::NotFound("Booking not found or not associated with this property".to_string()),
    )?;

    if !force && !booking.status.can_transition_to(target) {
        return Err(AppError::Validation(format!(
            "Invalid status transition from {} to {}. Set force to override",
            booking.status.as_str(),
            target.as_str()
        )));
    }

    queries::set_booking_status(&tx, booking_id, target)?;
    tx.commit()?;

    queries::get_booking_with_user(conn, booking_id)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("booking vanished after update")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnic_normalization_is_idempotent() {
        assert_eq!(normalize_cnic("12345-6789012-3").unwrap(), "1234567890123");
        assert_eq!(normalize_cnic("1234567890123").unwrap(), "1234567890123");
    }

    #[test]
    fn cnic_wrong_length_rejected() {
        assert!(normalize_cnic("12345").is_err());
        assert!(normalize_cnic("12345678901234").is_err());
        assert!(normalize_cnic("12345-67890a2-3").is_err());
    }

    #[test]
    fn phone_validation() {
        assert!(validate_phone("+923001234567").is_ok());
        assert!(validate_phone("03001234567").is_ok());
        assert!(validate_phone("+92300").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("+92300123456a").is_err());
    }

    #[test]
    fn booking_id_derivation() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 23).unwrap();
        assert_eq!(
            derive_booking_id("Ali Khan", &date, ShiftType::Day),
            "Ali_Khan-2025-07-23-Day"
        );
        assert_eq!(
            derive_booking_id("  Ali   Khan ", &date, ShiftType::FullNight),
            "Ali_Khan-2025-07-23-Full Night"
        );
    }

    #[test]
    fn guarded_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Confirmed));
    }
}

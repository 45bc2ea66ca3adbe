use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::ShiftType;

/// Sunday=0 day names, matching how the weekly price table is keyed.
pub fn day_of_week(date: &NaiveDate) -> &'static str {
    const DAYS: [&str; 7] = [
        "sunday",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
    ];
    DAYS[date.weekday().num_days_from_sunday() as usize]
}

/// Resolve the price for one (property, date, shift). Looked up fresh per
/// booking; a property without a pricing record and a pricing record
/// without a matching shift row fail differently.
pub fn resolve_price(
    conn: &Connection,
    property_id: &str,
    date: &NaiveDate,
    shift_type: ShiftType,
) -> Result<f64, AppError> {
    let pricing = queries::get_pricing_for_property(conn, property_id)?
        .ok_or_else(|| AppError::NotFound("Pricing not found for this property".to_string()))?;

    let day = day_of_week(date);
    queries::get_shift_price(conn, &pricing.pricing_id, day, shift_type)?.ok_or_else(|| {
        AppError::Validation(format!(
            "No pricing found for {} on {day}",
            shift_type.as_str()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunday_is_index_zero() {
        // 2025-07-20 is a Sunday, 2025-07-23 a Wednesday.
        let sunday = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2025, 7, 23).unwrap();
        assert_eq!(day_of_week(&sunday), "sunday");
        assert_eq!(day_of_week(&wednesday), "wednesday");
    }
}

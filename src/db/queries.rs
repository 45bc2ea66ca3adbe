use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Admin, Booking, BookingSource, BookingStatus, BookingWithUser, Owner, Property,
    PropertyPricing, PropertyType, ShiftPrice, ShiftType, User,
};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

pub fn now_ts() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FMT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FMT).map_err(|_| anyhow!("bad timestamp in store: {s}"))
}

fn parse_opt_ts(s: Option<String>) -> anyhow::Result<Option<NaiveDateTime>> {
    s.as_deref().map(parse_ts).transpose()
}

/// Builds `?1, ?2, ..` placeholders for an IN clause.
fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

// ── Users ──

const USER_COLS: &str = "user_id, name, email, phone_number, password, cnic, is_email_verified, \
     verification_code, verification_code_expires, reset_password_code, reset_password_expires, created_at";

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone_number: row.get(3)?,
        password: row.get(4)?,
        cnic: row.get(5)?,
        is_email_verified: row.get::<_, i64>(6)? != 0,
        verification_code: row.get(7)?,
        verification_code_expires: parse_opt_ts(row.get(8)?)?,
        reset_password_code: row.get(9)?,
        reset_password_expires: parse_opt_ts(row.get(10)?)?,
        created_at: parse_ts(&row.get::<_, String>(11)?)?,
    })
}

pub fn get_user_by_cnic(conn: &Connection, cnic: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE cnic = ?1"),
        params![cnic],
        |row| Ok(parse_user_row(row)),
    );
    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
        params![email],
        |row| Ok(parse_user_row(row)),
    );
    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Minimal row created on the fly when a booking arrives for an unknown CNIC.
pub fn create_booking_user(
    conn: &Connection,
    user_id: &str,
    cnic: &str,
    phone_number: &str,
    name: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, cnic, phone_number, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, cnic, phone_number, name, fmt_ts(&now_ts())],
    )?;
    Ok(())
}

pub fn create_signup_user(
    conn: &Connection,
    user_id: &str,
    name: Option<&str>,
    email: &str,
    phone_number: &str,
    password_hash: &str,
    cnic: Option<&str>,
    code: &str,
    code_expires: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, name, email, phone_number, password, cnic,
                            is_email_verified, verification_code, verification_code_expires, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9)",
        params![
            user_id,
            name,
            email,
            phone_number,
            password_hash,
            cnic,
            code,
            fmt_ts(code_expires),
            fmt_ts(&now_ts()),
        ],
    )?;
    Ok(())
}

/// Re-registration path: an unverified row is overwritten rather than erroring.
pub fn update_signup_user(
    conn: &Connection,
    user_id: &str,
    name: Option<&str>,
    phone_number: &str,
    password_hash: &str,
    cnic: Option<&str>,
    code: &str,
    code_expires: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET name = ?1, phone_number = ?2, password = ?3, cnic = ?4,
                verification_code = ?5, verification_code_expires = ?6
         WHERE user_id = ?7",
        params![
            name,
            phone_number,
            password_hash,
            cnic,
            code,
            fmt_ts(code_expires),
            user_id,
        ],
    )?;
    Ok(())
}

pub fn mark_user_verified(conn: &Connection, user_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET is_email_verified = 1, verification_code = NULL,
                verification_code_expires = NULL
         WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(())
}

pub fn clear_verification_code(conn: &Connection, user_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET verification_code = NULL, verification_code_expires = NULL
         WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(())
}

pub fn set_reset_code(
    conn: &Connection,
    user_id: &str,
    code: &str,
    expires: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET reset_password_code = ?1, reset_password_expires = ?2
         WHERE user_id = ?3",
        params![code, fmt_ts(expires), user_id],
    )?;
    Ok(())
}

pub fn clear_reset_code(conn: &Connection, user_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET reset_password_code = NULL, reset_password_expires = NULL
         WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(())
}

pub fn update_user_password(
    conn: &Connection,
    user_id: &str,
    password_hash: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET password = ?1, reset_password_code = NULL, reset_password_expires = NULL
         WHERE user_id = ?2",
        params![password_hash, user_id],
    )?;
    Ok(())
}

// ── Admins ──

pub fn create_admin(
    conn: &Connection,
    admin_id: &str,
    username: &str,
    password_hash: &str,
) -> anyhow::Result<()> {
    let now = fmt_ts(&now_ts());
    conn.execute(
        "INSERT INTO admins (admin_id, username, password, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![admin_id, username, password_hash, now],
    )?;
    Ok(())
}

fn parse_admin_row(row: &rusqlite::Row) -> anyhow::Result<Admin> {
    Ok(Admin {
        admin_id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: parse_ts(&row.get::<_, String>(3)?)?,
        updated_at: parse_ts(&row.get::<_, String>(4)?)?,
    })
}

pub fn get_admin_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<Admin>> {
    let result = conn.query_row(
        "SELECT admin_id, username, password, created_at, updated_at FROM admins WHERE username = ?1",
        params![username],
        |row| Ok(parse_admin_row(row)),
    );
    match result {
        Ok(admin) => Ok(Some(admin?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Owners ──

pub fn create_owner(
    conn: &Connection,
    owner_id: &str,
    name: Option<&str>,
    username: &str,
    password_hash: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO owners (owner_id, name, username, password, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![owner_id, name, username, password_hash, fmt_ts(&now_ts())],
    )?;
    Ok(())
}

fn parse_owner_row(row: &rusqlite::Row) -> anyhow::Result<Owner> {
    Ok(Owner {
        owner_id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        created_at: parse_ts(&row.get::<_, String>(4)?)?,
    })
}

pub fn get_owner_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<Owner>> {
    let result = conn.query_row(
        "SELECT owner_id, name, username, password, created_at FROM owners WHERE username = ?1",
        params![username],
        |row| Ok(parse_owner_row(row)),
    );
    match result {
        Ok(owner) => Ok(Some(owner?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn link_owner_property(
    conn: &Connection,
    owner_id: &str,
    property_id: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO owner_properties (owner_id, property_id) VALUES (?1, ?2)
         ON CONFLICT(owner_id, property_id) DO NOTHING",
        params![owner_id, property_id],
    )?;
    Ok(())
}

pub fn owner_owns_property(
    conn: &Connection,
    owner_id: &str,
    property_id: &str,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM owner_properties WHERE owner_id = ?1 AND property_id = ?2",
        params![owner_id, property_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_owner_property_ids(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT property_id FROM owner_properties WHERE owner_id = ?1")?;
    let rows = stmt.query_map(params![owner_id], |row| row.get(0))?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

// ── Properties ──

const PROPERTY_COLS: &str = "property_id, name, address, city, province, country, contact_no, \
     max_occupancy, property_type, advance_percentage, username, password, created_at";

fn parse_property_row(row: &rusqlite::Row) -> anyhow::Result<Property> {
    let type_str: String = row.get(8)?;
    Ok(Property {
        property_id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        province: row.get(4)?,
        country: row.get(5)?,
        contact_no: row.get(6)?,
        max_occupancy: row.get(7)?,
        property_type: PropertyType::parse(&type_str)
            .ok_or_else(|| anyhow!("unknown property type: {type_str}"))?,
        advance_percentage: row.get(9)?,
        username: row.get(10)?,
        password: row.get(11)?,
        created_at: parse_ts(&row.get::<_, String>(12)?)?,
    })
}

pub fn create_property(conn: &Connection, property: &Property) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO properties ({PROPERTY_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            property.property_id,
            property.name,
            property.address,
            property.city,
            property.province,
            property.country,
            property.contact_no,
            property.max_occupancy,
            property.property_type.as_str(),
            property.advance_percentage,
            property.username,
            property.password,
            fmt_ts(&property.created_at),
        ],
    )?;
    Ok(())
}

pub fn update_property(conn: &Connection, property: &Property) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE properties SET name = ?1, address = ?2, city = ?3, province = ?4,
                country = ?5, contact_no = ?6, max_occupancy = ?7, property_type = ?8,
                advance_percentage = ?9, username = ?10, password = ?11
         WHERE property_id = ?12",
        params![
            property.name,
            property.address,
            property.city,
            property.province,
            property.country,
            property.contact_no,
            property.max_occupancy,
            property.property_type.as_str(),
            property.advance_percentage,
            property.username,
            property.password,
            property.property_id,
        ],
    )?;
    Ok(())
}

pub fn get_property(conn: &Connection, property_id: &str) -> anyhow::Result<Option<Property>> {
    let result = conn.query_row(
        &format!("SELECT {PROPERTY_COLS} FROM properties WHERE property_id = ?1"),
        params![property_id],
        |row| Ok(parse_property_row(row)),
    );
    match result {
        Ok(property) => Ok(Some(property?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_property_by_username(
    conn: &Connection,
    username: &str,
) -> anyhow::Result<Option<Property>> {
    let result = conn.query_row(
        &format!("SELECT {PROPERTY_COLS} FROM properties WHERE username = ?1"),
        params![username],
        |row| Ok(parse_property_row(row)),
    );
    match result {
        Ok(property) => Ok(Some(property?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_properties_for_owner(
    conn: &Connection,
    owner_id: &str,
) -> anyhow::Result<Vec<Property>> {
    // owner_properties also carries a property_id column, so the selected
    // columns must be qualified or SQLite rejects the statement as ambiguous.
    let cols = PROPERTY_COLS
        .split(", ")
        .map(|c| format!("p.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {cols} FROM properties p
         INNER JOIN owner_properties op ON op.property_id = p.property_id
         WHERE op.owner_id = ?1"
    ))?;
    let rows = stmt.query_map(params![owner_id], |row| Ok(parse_property_row(row)))?;

    let mut properties = vec![];
    for row in rows {
        properties.push(row??);
    }
    Ok(properties)
}

// ── Pricing ──

pub fn get_pricing_for_property(
    conn: &Connection,
    property_id: &str,
) -> anyhow::Result<Option<PropertyPricing>> {
    let result = conn.query_row(
        "SELECT pricing_id, property_id, season_start, season_end, special_offer
         FROM property_pricing WHERE property_id = ?1",
        params![property_id],
        |row| {
            Ok(PropertyPricing {
                pricing_id: row.get(0)?,
                property_id: row.get(1)?,
                season_start: row
                    .get::<_, Option<String>>(2)?
                    .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
                season_end: row
                    .get::<_, Option<String>>(3)?
                    .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
                special_offer: row.get(4)?,
            })
        },
    );
    match result {
        Ok(pricing) => Ok(Some(pricing)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_pricing_for_property(conn: &Connection, property_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM property_shift_pricing WHERE pricing_id IN
             (SELECT pricing_id FROM property_pricing WHERE property_id = ?1)",
        params![property_id],
    )?;
    conn.execute(
        "DELETE FROM property_pricing WHERE property_id = ?1",
        params![property_id],
    )?;
    Ok(())
}

pub fn insert_pricing(
    conn: &Connection,
    pricing_id: &str,
    property_id: &str,
    season_start: Option<&NaiveDate>,
    season_end: Option<&NaiveDate>,
    special_offer: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO property_pricing (pricing_id, property_id, season_start, season_end, special_offer, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            pricing_id,
            property_id,
            season_start.map(|d| d.format(DATE_FMT).to_string()),
            season_end.map(|d| d.format(DATE_FMT).to_string()),
            special_offer,
            fmt_ts(&now_ts()),
        ],
    )?;
    Ok(())
}

pub fn insert_shift_price(
    conn: &Connection,
    pricing_id: &str,
    shift_price: &ShiftPrice,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO property_shift_pricing (pricing_id, day_of_week, shift_type, price)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            pricing_id,
            shift_price.day_of_week,
            shift_price.shift_type,
            shift_price.price,
        ],
    )?;
    Ok(())
}

pub fn get_shift_price(
    conn: &Connection,
    pricing_id: &str,
    day_of_week: &str,
    shift_type: ShiftType,
) -> anyhow::Result<Option<f64>> {
    let result = conn.query_row(
        "SELECT price FROM property_shift_pricing
         WHERE pricing_id = ?1 AND day_of_week = ?2 AND shift_type = ?3",
        params![pricing_id, day_of_week, shift_type.as_str()],
        |row| row.get(0),
    );
    match result {
        Ok(price) => Ok(Some(price)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

const BOOKING_COLS: &str = "booking_id, user_id, property_id, booking_date, shift_type, total_cost, \
     booking_source, status, payment_screenshot_url, booked_at, created_at, updated_at";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(3)?;
    let shift_str: String = row.get(4)?;
    let source_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;

    Ok(Booking {
        booking_id: row.get(0)?,
        user_id: row.get(1)?,
        property_id: row.get(2)?,
        booking_date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .map_err(|_| anyhow!("bad booking_date in store: {date_str}"))?,
        shift_type: ShiftType::parse(&shift_str)
            .ok_or_else(|| anyhow!("unknown shift_type: {shift_str}"))?,
        total_cost: row.get(5)?,
        booking_source: BookingSource::parse(&source_str)
            .ok_or_else(|| anyhow!("unknown booking_source: {source_str}"))?,
        status: BookingStatus::parse(&status_str)
            .ok_or_else(|| anyhow!("unknown status: {status_str}"))?,
        payment_screenshot_url: row.get(8)?,
        booked_at: parse_ts(&row.get::<_, String>(9)?)?,
        created_at: parse_ts(&row.get::<_, String>(10)?)?,
        updated_at: parse_ts(&row.get::<_, String>(11)?)?,
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            booking.booking_id,
            booking.user_id,
            booking.property_id,
            booking.booking_date.format(DATE_FMT).to_string(),
            booking.shift_type.as_str(),
            booking.total_cost,
            booking.booking_source.as_str(),
            booking.status.as_str(),
            booking.payment_screenshot_url,
            fmt_ts(&booking.booked_at),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, booking_id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE booking_id = ?1"),
        params![booking_id],
        |row| Ok(parse_booking_row(row)),
    );
    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn slot_taken(
    conn: &Connection,
    property_id: &str,
    booking_date: &NaiveDate,
    shift_type: ShiftType,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE property_id = ?1 AND booking_date = ?2 AND shift_type = ?3",
        params![
            property_id,
            booking_date.format(DATE_FMT).to_string(),
            shift_type.as_str(),
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Fetch a booking only if it belongs to one of the caller's properties.
pub fn get_booking_scoped(
    conn: &Connection,
    booking_id: &str,
    property_ids: &[String],
) -> anyhow::Result<Option<Booking>> {
    if property_ids.is_empty() {
        return Ok(None);
    }

    let placeholders = (2..=property_ids.len() + 1)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE booking_id = ?1 AND property_id IN ({placeholders})"
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(booking_id.to_string())];
    for id in property_ids {
        params_vec.push(Box::new(id.clone()));
    }
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params_refs.as_slice(), |row| Ok(parse_booking_row(row)));
    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_booking_with_user_row(row: &rusqlite::Row) -> anyhow::Result<BookingWithUser> {
    Ok(BookingWithUser {
        booking: parse_booking_row(row)?,
        user_name: row.get(12)?,
        user_phone_number: row.get(13)?,
        user_cnic: row.get(14)?,
        user_email: row.get(15)?,
    })
}

pub fn get_bookings_for_properties(
    conn: &Connection,
    property_ids: &[String],
) -> anyhow::Result<Vec<BookingWithUser>> {
    if property_ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!(
        "SELECT b.booking_id, b.user_id, b.property_id, b.booking_date, b.shift_type, b.total_cost,
                b.booking_source, b.status, b.payment_screenshot_url, b.booked_at, b.created_at, b.updated_at,
                u.name, u.phone_number, u.cnic, u.email
         FROM bookings b
         LEFT JOIN users u ON u.user_id = b.user_id
         WHERE b.property_id IN ({})",
        placeholders(property_ids.len())
    );

    let params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = property_ids
        .iter()
        .map(|id| Box::new(id.clone()) as Box<dyn rusqlite::types::ToSql>)
        .collect();
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(parse_booking_with_user_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_with_user(
    conn: &Connection,
    booking_id: &str,
) -> anyhow::Result<Option<BookingWithUser>> {
    let result = conn.query_row(
        "SELECT b.booking_id, b.user_id, b.property_id, b.booking_date, b.shift_type, b.total_cost,
                b.booking_source, b.status, b.payment_screenshot_url, b.booked_at, b.created_at, b.updated_at,
                u.name, u.phone_number, u.cnic, u.email
         FROM bookings b
         LEFT JOIN users u ON u.user_id = b.user_id
         WHERE b.booking_id = ?1",
        params![booking_id],
        |row| Ok(parse_booking_with_user_row(row)),
    );
    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Confirmed bookings whose date is strictly before `today`, limited to the
/// given properties. Feeds the bulk-complete sweep.
pub fn get_confirmed_past_bookings(
    conn: &Connection,
    property_ids: &[String],
    today: &NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    if property_ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = (2..=property_ids.len() + 1)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {BOOKING_COLS} FROM bookings
         WHERE status = 'Confirmed' AND booking_date < ?1 AND property_id IN ({placeholders})"
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(today.format(DATE_FMT).to_string())];
    for id in property_ids {
        params_vec.push(Box::new(id.clone()));
    }
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn set_booking_status(
    conn: &Connection,
    booking_id: &str,
    status: BookingStatus,
) -> anyhow::Result<NaiveDateTime> {
    let now = now_ts();
    conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE booking_id = ?3",
        params![status.as_str(), fmt_ts(&now), booking_id],
    )?;
    Ok(now)
}

// ── Admin views (bot-sourced bookings only) ──

pub struct AdminBookingRow {
    pub booking: BookingWithUser,
    pub property_name: Option<String>,
    pub property_address: Option<String>,
    pub property_city: Option<String>,
}

pub fn get_bot_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AdminBookingRow>> {
    let base = "SELECT b.booking_id, b.user_id, b.property_id, b.booking_date, b.shift_type, b.total_cost,
                b.booking_source, b.status, b.payment_screenshot_url, b.booked_at, b.created_at, b.updated_at,
                u.name, u.phone_number, u.cnic, u.email,
                p.name, p.address, p.city
         FROM bookings b
         LEFT JOIN users u ON u.user_id = b.user_id
         LEFT JOIN properties p ON p.property_id = b.property_id
         WHERE b.booking_source = 'WhatsApp Bot'";

    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!("{base} AND b.status = ?1 ORDER BY b.booked_at DESC LIMIT ?2 OFFSET ?3"),
            vec![
                Box::new(status.as_str().to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
                Box::new(offset),
            ],
        ),
        None => (
            format!("{base} ORDER BY b.booked_at DESC LIMIT ?1 OFFSET ?2"),
            vec![
                Box::new(limit) as Box<dyn rusqlite::types::ToSql>,
                Box::new(offset),
            ],
        ),
    };

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        let property_name: Option<String> = row.get(16)?;
        let property_address: Option<String> = row.get(17)?;
        let property_city: Option<String> = row.get(18)?;
        Ok((
            parse_booking_with_user_row(row),
            property_name,
            property_address,
            property_city,
        ))
    })?;

    let mut bookings = vec![];
    for row in rows {
        let (booking, property_name, property_address, property_city) = row?;
        bookings.push(AdminBookingRow {
            booking: booking?,
            property_name,
            property_address,
            property_city,
        });
    }
    Ok(bookings)
}

pub fn count_bot_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
) -> anyhow::Result<i64> {
    let count = match status_filter {
        Some(status) => conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE booking_source = 'WhatsApp Bot' AND status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE booking_source = 'WhatsApp Bot'",
            [],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

pub fn get_bot_booking(conn: &Connection, booking_id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!(
            "SELECT {BOOKING_COLS} FROM bookings
             WHERE booking_id = ?1 AND booking_source = 'WhatsApp Bot'"
        ),
        params![booking_id],
        |row| Ok(parse_booking_row(row)),
    );
    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Messages / Sessions ──

pub fn delete_user_messages(conn: &Connection, user_id: &str) -> anyhow::Result<usize> {
    let count = conn.execute("DELETE FROM messages WHERE user_id = ?1", params![user_id])?;
    Ok(count)
}

pub fn delete_user_sessions(conn: &Connection, user_id: &str) -> anyhow::Result<usize> {
    let count = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
    Ok(count)
}

pub fn count_user_messages(conn: &Connection, user_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn insert_message(
    conn: &Connection,
    user_id: &str,
    role: &str,
    content: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO messages (user_id, role, content) VALUES (?1, ?2, ?3)",
        params![user_id, role, content],
    )?;
    Ok(())
}

pub fn insert_session(conn: &Connection, user_id: &str, data: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sessions (user_id, data) VALUES (?1, ?2)",
        params![user_id, data],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        crate::db::init_db(":memory:").unwrap()
    }

    fn sample_property(property_id: &str, username: &str) -> Property {
        Property {
            property_id: property_id.to_string(),
            name: "Test Hut".to_string(),
            address: None,
            city: None,
            province: None,
            country: None,
            contact_no: None,
            max_occupancy: None,
            property_type: PropertyType::Hut,
            advance_percentage: None,
            username: username.to_string(),
            password: "hash".to_string(),
            created_at: now_ts(),
        }
    }

    #[test]
    fn owner_join_returns_qualified_property_rows() {
        let conn = test_conn();
        create_property(&conn, &sample_property("prop-1", "hut_one")).unwrap();
        create_property(&conn, &sample_property("prop-2", "hut_two")).unwrap();
        create_owner(&conn, "own-1", None, "owner", "hash").unwrap();
        link_owner_property(&conn, "own-1", "prop-1").unwrap();

        let properties = get_properties_for_owner(&conn, "own-1").unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].property_id, "prop-1");
    }

    #[test]
    fn corrupt_stored_timestamp_is_an_error() {
        let conn = test_conn();
        conn.execute(
            "INSERT INTO users (user_id, email, created_at) VALUES ('u-1', 'a@b.c', 'garbage')",
            [],
        )
        .unwrap();
        assert!(get_user_by_email(&conn, "a@b.c").is_err());
    }
}

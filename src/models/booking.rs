use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub user_id: Option<String>,
    pub property_id: String,
    pub booking_date: NaiveDate,
    pub shift_type: ShiftType,
    pub total_cost: f64,
    pub booking_source: BookingSource,
    pub status: BookingStatus,
    pub payment_screenshot_url: Option<String>,
    pub booked_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Booking joined with the limited user columns exposed to property/owner
/// and admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithUser {
    #[serde(flatten)]
    pub booking: Booking,
    pub user_name: Option<String>,
    pub user_phone_number: Option<String>,
    pub user_cnic: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(BookingStatus::Pending),
            "Confirmed" => Some(BookingStatus::Confirmed),
            "Cancelled" => Some(BookingStatus::Cancelled),
            "Completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// The guarded status graph. `Cancelled` and `Completed` are terminal;
    /// a forced admin reassignment bypasses this entirely.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftType {
    Day,
    Night,
    #[serde(rename = "Full Day")]
    FullDay,
    #[serde(rename = "Full Night")]
    FullNight,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Day => "Day",
            ShiftType::Night => "Night",
            ShiftType::FullDay => "Full Day",
            ShiftType::FullNight => "Full Night",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Day" => Some(ShiftType::Day),
            "Night" => Some(ShiftType::Night),
            "Full Day" => Some(ShiftType::FullDay),
            "Full Night" => Some(ShiftType::FullNight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingSource {
    Website,
    #[serde(rename = "WhatsApp Bot")]
    WhatsAppBot,
    #[serde(rename = "Third-Party")]
    ThirdParty,
}

impl BookingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSource::Website => "Website",
            BookingSource::WhatsAppBot => "WhatsApp Bot",
            BookingSource::ThirdParty => "Third-Party",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Website" => Some(BookingSource::Website),
            "WhatsApp Bot" => Some(BookingSource::WhatsAppBot),
            "Third-Party" => Some(BookingSource::ThirdParty),
            _ => None,
        }
    }
}

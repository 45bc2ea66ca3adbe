use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub property_id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub contact_no: Option<String>,
    pub max_occupancy: Option<i64>,
    pub property_type: PropertyType,
    pub advance_percentage: Option<f64>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Hut,
    Farm,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Hut => "hut",
            PropertyType::Farm => "farm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hut" => Some(PropertyType::Hut),
            "farm" => Some(PropertyType::Farm),
            _ => None,
        }
    }
}

/// A property has at most one active pricing record; shift prices hang off
/// it keyed by (day_of_week, shift_type).
#[derive(Debug, Clone, Serialize)]
pub struct PropertyPricing {
    pub pricing_id: String,
    pub property_id: String,
    pub season_start: Option<NaiveDate>,
    pub season_end: Option<NaiveDate>,
    pub special_offer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftPrice {
    pub day_of_week: String,
    pub shift_type: String,
    pub price: f64,
}

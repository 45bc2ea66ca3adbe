use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub cnic: Option<String>,
    pub is_email_verified: bool,
    pub verification_code: Option<String>,
    pub verification_code_expires: Option<NaiveDateTime>,
    pub reset_password_code: Option<String>,
    pub reset_password_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct Admin {
    pub admin_id: String,
    pub username: String,
    pub password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

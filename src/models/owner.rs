use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct Owner {
    pub owner_id: String,
    pub name: Option<String>,
    pub username: String,
    pub password: String,
    pub created_at: NaiveDateTime,
}

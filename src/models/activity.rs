use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub image: String,
    pub question_count: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

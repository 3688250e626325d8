use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub enterprise: String,
    pub activity_name: String,
    pub submitted_on: NaiveDate,
    pub answers: AnswerSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub name: String,
    pub phone: String,
    pub enterprise: String,
}

impl CustomerIdentity {
    /// Identity used when the agent starts a session without a recommended customer.
    pub fn walk_in() -> Self {
        Self {
            name: "访客".to_string(),
            phone: "13800000000".to_string(),
            enterprise: "临时企业".to_string(),
        }
    }
}

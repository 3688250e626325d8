use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::submission::CustomerIdentity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecommendation {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub wsm_date: NaiveDate,
    pub enterprise: String,
    pub activity_name: String,
}

impl CustomerRecommendation {
    pub fn identity(&self) -> CustomerIdentity {
        CustomerIdentity {
            name: self.name.clone(),
            phone: self.phone.clone(),
            enterprise: self.enterprise.clone(),
        }
    }
}

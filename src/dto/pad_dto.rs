use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::report_dto::ResultDetail;
use crate::dto::session_dto::{ActivitySummary, SessionSnapshot};
use crate::models::recommendation::CustomerRecommendation;
use crate::utils::mask::{mask_name, mask_phone};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionPollQuery {
    pub after_version: Option<u64>,
    pub wait_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct OpenChallengeRequest {
    #[validate(length(min = 1, max = 64))]
    pub recommendation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct RecommendationListQuery {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

/// Recommended customer as listed on the pad's home screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationView {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub wsm_date: NaiveDate,
    pub enterprise: String,
    pub activity_name: String,
}

impl From<&CustomerRecommendation> for RecommendationView {
    fn from(value: &CustomerRecommendation) -> Self {
        Self {
            id: value.id.clone(),
            name: mask_name(&value.name),
            phone: mask_phone(&value.phone),
            wsm_date: value.wsm_date,
            enterprise: value.enterprise.clone(),
            activity_name: value.activity_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationListResponse {
    pub items: Vec<RecommendationView>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityListResponse {
    pub items: Vec<ActivitySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SelectOptionRequest {
    pub question_id: u32,
    #[validate(length(min = 1, max = 200))]
    pub option: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub applied: bool,
    pub record: ResultDetail,
    pub session: SessionSnapshot,
}

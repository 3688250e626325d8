use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::activity::Activity;
use crate::models::answer::AnswerSet;
use crate::models::qr_challenge::QrStatus;
use crate::models::question::{Question, QuestionKind};
use crate::models::screen::{AgentScreen, PhoneScreen};
use crate::models::submission::CustomerIdentity;
use crate::services::questionnaire_service::QuestionnairePhase;
use crate::utils::mask::{mask_name, mask_phone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u64,
    pub agent_screen: AgentScreen,
    pub phone_screen: PhoneScreen,
    pub qr_status: QrStatus,
    pub challenge_displayed: bool,
    pub challenge: Option<ChallengeView>,
    pub selected_activity: Option<ActivitySummary>,
    pub customer: Option<MaskedCustomer>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeView {
    pub id: String,
    pub qr_payload: String,
    pub remaining_secs: u32,
    pub validity_secs: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneView {
    pub version: u64,
    pub phone_screen: PhoneScreen,
    pub qr_status: QrStatus,
    pub pad_showing_qr: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: String,
    pub title: String,
    pub image: String,
    pub question_count: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Activity> for ActivitySummary {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id.clone(),
            title: activity.title.clone(),
            image: activity.image.clone(),
            question_count: activity.question_count,
            is_available: activity.is_available,
            created_at: activity.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedCustomer {
    pub name: String,
    pub phone: String,
    pub enterprise: String,
}

impl From<&CustomerIdentity> for MaskedCustomer {
    fn from(identity: &CustomerIdentity) -> Self {
        Self {
            name: mask_name(&identity.name),
            phone: mask_phone(&identity.phone),
            enterprise: identity.enterprise.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineItem {
    pub index: usize,
    pub question_id: u32,
    pub title: String,
    pub kind: QuestionKind,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewView {
    pub activity: ActivitySummary,
    pub outline: Vec<OutlineItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionnaireView {
    pub activity_title: String,
    pub index: usize,
    pub total: usize,
    pub progress_percent: u32,
    pub phase: QuestionnairePhase,
    pub can_advance: bool,
    pub is_last: bool,
    pub question: Question,
    pub answers: AnswerSet,
}

/// Body of every transition endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse<T> {
    pub applied: bool,
    pub session: T,
}

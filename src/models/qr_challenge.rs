use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrStatus {
    Idle,
    Scanning,
    Scanned,
    Authorized,
    Rejected,
    Expired,
}

impl QrStatus {
    /// The countdown only runs while the code is waiting for, or being, scanned.
    pub fn counts_down(self) -> bool {
        matches!(self, QrStatus::Idle | QrStatus::Scanning)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrChallenge {
    pub id: String,
    pub generation: u64,
    pub created_at: DateTime<Utc>,
    pub remaining_secs: u32,
}

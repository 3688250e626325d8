use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct ScanRequest {
    /// Content read from the pad's QR code. Omitted by the simulated camera.
    #[validate(length(min = 1, max = 256))]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub confirmed: bool,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadAction {
    #[default]
    Draft, // Textarea blur or prompt closed
    Send,
}

#[derive(Deserialize, Validate)]
pub struct LeadRequest {
    pub session_id: Option<String>,
    #[validate(length(max = 5000, message = "Message too long"))]
    pub message: String,
    #[serde(default)]
    pub action: LeadAction,
    #[validate(length(max = 64))]
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct LeadResponse {
    pub saved: bool,
    pub handoff_url: Option<String>,
}

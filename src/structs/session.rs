use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::geo::ReportedPosition;

#[derive(Deserialize, Validate)]
pub struct VisitRequest {
    #[serde(default = "root_path")]
    #[validate(length(min = 1, max = 2048, message = "Invalid path"))]
    pub path: String,
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub language: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub screen_size: String, // "WxH"
    #[serde(default)]
    pub location: ReportedPosition, // Outcome of the browser permission prompt
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct VisitResponse {
    pub logged: bool,
    pub visit_id: Option<String>,
}

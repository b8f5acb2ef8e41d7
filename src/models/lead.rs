use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::lenient;

pub const UNKNOWN_VISIT: &str = "unknown";
pub const DEFAULT_LEAD_SOURCE: &str = "ServiceModal";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Draft,
    Sent,
}

/// A captured inquiry from the engagement prompt. Appended, never updated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", from = "StoredLead")]
pub struct LeadDraft {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub visit_id: String, // Weak reference to the originating visit
    pub status: LeadStatus,
    pub source: String,
}

/// A lead document as read back from the store; bad fields become defaults
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLead {
    #[serde(rename = "_id", default)]
    id: Option<ObjectId>,
    #[serde(default, deserialize_with = "lenient::text")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    visit_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    source: Option<String>,
}

impl From<StoredLead> for LeadDraft {
    fn from(stored: StoredLead) -> Self {
        Self {
            id: stored.id,
            message: stored.message.unwrap_or_default(),
            timestamp: stored.timestamp,
            visit_id: stored.visit_id.unwrap_or_else(unknown_visit),
            status: match stored.status.as_deref() {
                Some("sent") => LeadStatus::Sent,
                _ => LeadStatus::Draft,
            },
            source: stored.source.unwrap_or_else(default_source),
        }
    }
}

impl LeadDraft {
    pub fn new(
        message: String,
        visit_id: Option<String>,
        status: LeadStatus,
        source: String,
    ) -> Self {
        Self {
            id: None,
            message,
            timestamp: None,
            visit_id: visit_id.unwrap_or_else(unknown_visit),
            status,
            source,
        }
    }
}

fn unknown_visit() -> String {
    UNKNOWN_VISIT.to_string()
}

fn default_source() -> String {
    DEFAULT_LEAD_SOURCE.to_string()
}

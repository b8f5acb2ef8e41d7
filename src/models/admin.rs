use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Dashboard account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
    pub last_login: Option<i64>,
    pub is_active: bool,
}

impl AdminUser {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: None,
            email,
            password_hash,
            created_at: chrono::Utc::now().timestamp_millis(),
            last_login: None,
            is_active: true,
        }
    }
}

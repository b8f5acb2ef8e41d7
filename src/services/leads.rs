use std::sync::Arc;

use log::{error, info};

use crate::db::DocumentStore;
use crate::models::lead::{LeadDraft, LeadStatus};
use crate::services::session::SessionContext;

/// Saves engagement-prompt messages and builds the messaging handoff link
pub struct LeadCapture {
    store: Arc<dyn DocumentStore>,
    handoff_phone: String,
    owner_name: String,
}

impl LeadCapture {
    pub fn new(store: Arc<dyn DocumentStore>, handoff_phone: &str, owner_name: &str) -> Self {
        Self {
            store,
            handoff_phone: handoff_phone.to_string(),
            owner_name: owner_name.to_string(),
        }
    }

    /// Append a lead. Blank messages are ignored and failures only logged.
    pub async fn save(
        &self,
        session: Option<&SessionContext>,
        message: &str,
        status: LeadStatus,
        source: &str,
    ) -> Option<String> {
        if message.trim().is_empty() {
            return None;
        }

        let visit_id = session.and_then(|s| s.visit_id()).map(String::from);
        let lead = LeadDraft::new(message.to_string(), visit_id, status, source.to_string());

        match self.store.append_lead(lead).await {
            Ok(id) => {
                info!("Lead {} saved as {:?} from {}", id, status, source);
                Some(id)
            }
            Err(e) => {
                error!("Error saving lead: {:#}", e);
                None
            }
        }
    }

    /// Pre-filled WhatsApp link for the visitor's message
    pub fn handoff_url(&self, message: &str) -> String {
        let text = format!(
            "Hi {}, I saw your portfolio and I'm interested in your services: {}",
            self.owner_name,
            message.trim()
        );
        format!(
            "https://wa.me/{}?text={}",
            self.handoff_phone,
            urlencoding::encode(&text)
        )
    }
}

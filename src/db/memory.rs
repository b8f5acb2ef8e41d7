use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::db::store::DocumentStore;
use crate::models::admin::AdminUser;
use crate::models::lead::LeadDraft;
use crate::models::visit::VisitRecord;

/// Process-local store for development runs (`STORE_BACKEND=memory`) and tests.
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    visits: Mutex<Vec<VisitRecord>>,
    leads: Mutex<Vec<LeadDraft>>,
    admins: Mutex<Vec<AdminUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(items: &[T], timestamp: impl Fn(&T) -> Option<i64>) -> Vec<T> {
    let mut sorted = items.to_vec();
    // Stable, so equal timestamps keep the later insert first after the reverse
    sorted.reverse();
    sorted.sort_by_key(|item| std::cmp::Reverse(timestamp(item).unwrap_or(i64::MIN)));
    sorted
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn append_visit(&self, mut visit: VisitRecord) -> Result<String> {
        let now = chrono::Utc::now().timestamp_millis();
        let id = ObjectId::new();
        visit.id = Some(id);
        visit.timestamp = Some(now);
        visit.last_ping = Some(now);
        visit.duration = 0;

        let mut visits = self.visits.lock().unwrap_or_else(|e| e.into_inner());
        visits.push(visit);
        Ok(id.to_hex())
    }

    async fn extend_visit(&self, visit_id: &str, seconds: i64) -> Result<()> {
        let object_id = ObjectId::parse_str(visit_id).context("Invalid visit id")?;

        let mut visits = self.visits.lock().unwrap_or_else(|e| e.into_inner());
        let visit = visits
            .iter_mut()
            .find(|v| v.id == Some(object_id))
            .ok_or_else(|| anyhow!("Visit {} not found", visit_id))?;
        visit.duration += seconds;
        visit.last_ping = Some(chrono::Utc::now().timestamp_millis());
        Ok(())
    }

    async fn list_visits(&self) -> Result<Vec<VisitRecord>> {
        let visits = self.visits.lock().unwrap_or_else(|e| e.into_inner());
        Ok(newest_first(&visits, |v| v.timestamp))
    }

    async fn append_lead(&self, mut lead: LeadDraft) -> Result<String> {
        let id = ObjectId::new();
        lead.id = Some(id);
        lead.timestamp = Some(chrono::Utc::now().timestamp_millis());

        let mut leads = self.leads.lock().unwrap_or_else(|e| e.into_inner());
        leads.push(lead);
        Ok(id.to_hex())
    }

    async fn list_leads(&self) -> Result<Vec<LeadDraft>> {
        let leads = self.leads.lock().unwrap_or_else(|e| e.into_inner());
        Ok(newest_first(&leads, |l| l.timestamp))
    }

    async fn find_admin(&self, email: &str) -> Result<Option<AdminUser>> {
        let admins = self.admins.lock().unwrap_or_else(|e| e.into_inner());
        Ok(admins
            .iter()
            .find(|a| a.email == email && a.is_active)
            .cloned())
    }

    async fn count_admins(&self) -> Result<u64> {
        let admins = self.admins.lock().unwrap_or_else(|e| e.into_inner());
        Ok(admins.len() as u64)
    }

    async fn insert_admin(&self, mut admin: AdminUser) -> Result<()> {
        admin.id = Some(ObjectId::new());
        let mut admins = self.admins.lock().unwrap_or_else(|e| e.into_inner());
        admins.push(admin);
        Ok(())
    }

    async fn record_admin_login(&self, email: &str, at: i64) -> Result<()> {
        let mut admins = self.admins.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(admin) = admins.iter_mut().find(|a| a.email == email) {
            admin.last_login = Some(at);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

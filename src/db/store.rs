use anyhow::Result;
use async_trait::async_trait;

use crate::models::admin::AdminUser;
use crate::models::lead::LeadDraft;
use crate::models::visit::VisitRecord;

pub const VISITS_COLLECTION: &str = "visits";
pub const LEADS_COLLECTION: &str = "leads";
pub const ADMINS_COLLECTION: &str = "admins";

/// Append/read/update access to the `visits`, `leads` and `admins` collections.
///
/// Timestamps on appended documents are assigned by the store, not the caller.
/// There is no delete.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a visit and return its document id (hex)
    async fn append_visit(&self, visit: VisitRecord) -> Result<String>;

    /// Add `seconds` to the visit's duration and refresh `lastPing`
    async fn extend_visit(&self, visit_id: &str, seconds: i64) -> Result<()>;

    /// All visits, newest first
    async fn list_visits(&self) -> Result<Vec<VisitRecord>>;

    async fn append_lead(&self, lead: LeadDraft) -> Result<String>;

    /// All leads, newest first
    async fn list_leads(&self) -> Result<Vec<LeadDraft>>;

    async fn find_admin(&self, email: &str) -> Result<Option<AdminUser>>;

    async fn count_admins(&self) -> Result<u64>;

    async fn insert_admin(&self, admin: AdminUser) -> Result<()>;

    async fn record_admin_login(&self, email: &str, at: i64) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

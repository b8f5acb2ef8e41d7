use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection, Database};

use crate::config::AppConfig;
use crate::db::store::{ADMINS_COLLECTION, DocumentStore, LEADS_COLLECTION, VISITS_COLLECTION};
use crate::models::admin::AdminUser;
use crate::models::lead::LeadDraft;
use crate::models::visit::VisitRecord;

/// Connect to MongoDB and return the configured database
pub async fn get_database(config: &AppConfig) -> Result<Database> {
    let uri = config
        .mongodb_uri
        .as_deref()
        .ok_or_else(|| anyhow!("MONGODB_URI not set"))?;

    let client = Client::with_uri_str(uri)
        .await
        .context("Failed to create MongoDB client")?;
    let db = client.database(&config.database_name);

    // Fail fast if the server is unreachable
    db.run_command(doc! { "ping": 1 })
        .await
        .context("MongoDB ping failed")?;

    log::info!("Connected to MongoDB database '{}'", config.database_name);
    Ok(db)
}

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn visits(&self) -> Collection<VisitRecord> {
        self.db.collection::<VisitRecord>(VISITS_COLLECTION)
    }

    fn leads(&self) -> Collection<LeadDraft> {
        self.db.collection::<LeadDraft>(LEADS_COLLECTION)
    }

    fn admins(&self) -> Collection<AdminUser> {
        self.db.collection::<AdminUser>(ADMINS_COLLECTION)
    }
}

fn inserted_hex(id: &mongodb::bson::Bson) -> Result<String> {
    id.as_object_id()
        .map(|oid| oid.to_hex())
        .ok_or_else(|| anyhow!("Inserted document has no ObjectId"))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn append_visit(&self, mut visit: VisitRecord) -> Result<String> {
        let now = chrono::Utc::now().timestamp_millis();
        visit.timestamp = Some(now);
        visit.last_ping = Some(now);
        visit.duration = 0;

        let result = self
            .visits()
            .insert_one(&visit)
            .await
            .context("Failed to insert visit")?;
        inserted_hex(&result.inserted_id)
    }

    async fn extend_visit(&self, visit_id: &str, seconds: i64) -> Result<()> {
        let object_id = ObjectId::parse_str(visit_id).context("Invalid visit id")?;

        // Single update document so the increment is atomic on the server
        let result = self
            .visits()
            .update_one(
                doc! { "_id": object_id },
                doc! {
                    "$inc": { "duration": seconds },
                    "$set": { "lastPing": chrono::Utc::now().timestamp_millis() },
                },
            )
            .await
            .context("Failed to update visit duration")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Visit {} not found", visit_id));
        }
        Ok(())
    }

    async fn list_visits(&self) -> Result<Vec<VisitRecord>> {
        self.visits()
            .find(doc! {})
            .sort(doc! { "timestamp": -1 })
            .await
            .context("Failed to query visits")?
            .try_collect::<Vec<VisitRecord>>()
            .await
            .context("Failed to read visits")
    }

    async fn append_lead(&self, mut lead: LeadDraft) -> Result<String> {
        lead.timestamp = Some(chrono::Utc::now().timestamp_millis());

        let result = self
            .leads()
            .insert_one(&lead)
            .await
            .context("Failed to insert lead")?;
        inserted_hex(&result.inserted_id)
    }

    async fn list_leads(&self) -> Result<Vec<LeadDraft>> {
        self.leads()
            .find(doc! {})
            .sort(doc! { "timestamp": -1 })
            .await
            .context("Failed to query leads")?
            .try_collect::<Vec<LeadDraft>>()
            .await
            .context("Failed to read leads")
    }

    async fn find_admin(&self, email: &str) -> Result<Option<AdminUser>> {
        self.admins()
            .find_one(doc! { "email": email, "isActive": true })
            .await
            .context("Failed to query admins")
    }

    async fn count_admins(&self) -> Result<u64> {
        self.admins()
            .count_documents(doc! {})
            .await
            .context("Failed to count admins")
    }

    async fn insert_admin(&self, admin: AdminUser) -> Result<()> {
        self.admins()
            .insert_one(&admin)
            .await
            .context("Failed to insert admin")?;
        Ok(())
    }

    async fn record_admin_login(&self, email: &str, at: i64) -> Result<()> {
        self.admins()
            .update_one(doc! { "email": email }, doc! { "$set": { "lastLogin": at } })
            .await
            .context("Failed to update last login")?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

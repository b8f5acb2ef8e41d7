//! Stub collaborators shared by the unit tests.

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::db::DocumentStore;
use crate::db::memory::MemoryStore;
use crate::models::admin::AdminUser;
use crate::models::lead::LeadDraft;
use crate::models::visit::{Coordinates, GeoPlace, IpLocation, VisitRecord};
use crate::services::geo::{IpLocator, PositionError, PositionSource, ReverseGeocoder};
use crate::state::app_state::AppState;

pub struct StubIpLocator {
    result: Option<IpLocation>,
    pub calls: Arc<AtomicUsize>,
}

impl StubIpLocator {
    pub fn found(location: IpLocation) -> Self {
        Self {
            result: Some(location),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl IpLocator for StubIpLocator {
    async fn locate(&self, _ip: &str) -> Result<IpLocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Some(location) => Ok(location.clone()),
            None => bail!("lookup unavailable"),
        }
    }
}

pub struct StubGeocoder {
    result: Option<GeoPlace>,
}

impl StubGeocoder {
    pub fn found(place: GeoPlace) -> Self {
        Self { result: Some(place) }
    }

    pub fn failing() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl ReverseGeocoder for StubGeocoder {
    async fn reverse(&self, _coordinates: Coordinates) -> Result<GeoPlace> {
        match &self.result {
            Some(place) => Ok(place.clone()),
            None => bail!("geocoder unavailable"),
        }
    }
}

/// A permission prompt nobody answers
pub struct NeverAnswers;

#[async_trait]
impl PositionSource for NeverAnswers {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, PositionError> {
        pending().await
    }
}

/// Every operation fails
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn append_visit(&self, _visit: VisitRecord) -> Result<String> {
        bail!("store offline")
    }

    async fn extend_visit(&self, _visit_id: &str, _seconds: i64) -> Result<()> {
        bail!("store offline")
    }

    async fn list_visits(&self) -> Result<Vec<VisitRecord>> {
        bail!("store offline")
    }

    async fn append_lead(&self, _lead: LeadDraft) -> Result<String> {
        bail!("store offline")
    }

    async fn list_leads(&self) -> Result<Vec<LeadDraft>> {
        bail!("store offline")
    }

    async fn find_admin(&self, _email: &str) -> Result<Option<AdminUser>> {
        bail!("store offline")
    }

    async fn count_admins(&self) -> Result<u64> {
        bail!("store offline")
    }

    async fn insert_admin(&self, _admin: AdminUser) -> Result<()> {
        bail!("store offline")
    }

    async fn record_admin_login(&self, _email: &str, _at: i64) -> Result<()> {
        bail!("store offline")
    }

    async fn ping(&self) -> Result<()> {
        bail!("store offline")
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// App state over an in-memory store with lookups that resolve to Chennai
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        AppConfig::for_tests(),
        store.clone(),
        Arc::new(StubIpLocator::found(IpLocation {
            city: Some("Chennai".to_string()),
            country: Some("India".to_string()),
            ip: Some("49.37.1.1".to_string()),
        })),
        Arc::new(StubGeocoder::found(GeoPlace {
            city: Some("Tiruchirappalli".to_string()),
            country: Some("India".to_string()),
        })),
    );
    (state, store)
}

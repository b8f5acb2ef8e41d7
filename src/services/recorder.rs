use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::db::DocumentStore;
use crate::models::visit::{ANONYMOUS_IP, VisitRecord};
use crate::services::geo::{IpLocator, PositionError, PositionSource, ReverseGeocoder};
use crate::services::session::SessionContext;
use crate::utils::hash_ip::hash_ip;

/// Browser-side signals sent along with the first page load
#[derive(Debug, Clone, Default)]
pub struct PageEnvironment {
    pub user_agent: String,
    pub path: String,
    pub referrer: Option<String>,
    pub language: String,
    pub screen_size: String,
}

/// Captures one best-effort visit snapshot per session.
///
/// Enrichment runs in a fixed order: IP lookup, then the GPS upgrade, then
/// the store write. Nothing in here returns an error to the caller; every
/// failure degrades to the next-best data and is logged.
pub struct VisitRecorder {
    store: Arc<dyn DocumentStore>,
    ip_locator: Arc<dyn IpLocator>,
    geocoder: Arc<dyn ReverseGeocoder>,
    gps_timeout: Duration,
    ip_salt: Option<String>, // Set when visitor IPs are stored hashed
}

impl VisitRecorder {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ip_locator: Arc<dyn IpLocator>,
        geocoder: Arc<dyn ReverseGeocoder>,
        gps_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ip_locator,
            geocoder,
            gps_timeout,
            ip_salt: None,
        }
    }

    pub fn with_ip_hashing(mut self, salt: impl Into<String>) -> Self {
        self.ip_salt = Some(salt.into());
        self
    }

    /// Record the session's visit. Returns the new visit id, or `None` when the
    /// session was already captured or the write failed.
    pub async fn record_visit(
        &self,
        session: &SessionContext,
        environment: PageEnvironment,
        position: &dyn PositionSource,
        client_ip: Option<&str>,
    ) -> Option<String> {
        if session.is_logged() || !session.try_begin_capture() {
            debug!(
                "Visit for session {} already captured, skipping",
                session.session_id()
            );
            return None;
        }

        let mut visit = VisitRecord::new(
            environment.user_agent,
            environment.path,
            environment.referrer,
            environment.language,
            environment.screen_size,
        );

        self.enrich_from_ip(&mut visit, client_ip).await;
        self.upgrade_from_gps(&mut visit, position).await;

        if let Some(salt) = &self.ip_salt {
            if visit.ip != ANONYMOUS_IP {
                visit.ip = hash_ip(&visit.ip, salt);
            }
        }

        let (city, country, method) = (visit.city.clone(), visit.country.clone(), visit.method);
        match self.store.append_visit(visit).await {
            Ok(visit_id) => {
                session.mark_logged(visit_id.clone());
                info!(
                    "Visit logged: {}, {} via {:?} (session {})",
                    city,
                    country,
                    method,
                    session.session_id()
                );
                Some(visit_id)
            }
            Err(e) => {
                error!(
                    "Error logging visit for session {}: {:#}",
                    session.session_id(),
                    e
                );
                None
            }
        }
    }

    async fn enrich_from_ip(&self, visit: &mut VisitRecord, client_ip: Option<&str>) {
        let Some(ip) = client_ip else {
            warn!("IP lookup skipped: client address unknown");
            return;
        };

        match self.ip_locator.locate(ip).await {
            Ok(location) => visit.apply_ip_location(location),
            Err(e) => warn!("IP lookup failed, keeping defaults: {:#}", e),
        }
    }

    async fn upgrade_from_gps(&self, visit: &mut VisitRecord, position: &dyn PositionSource) {
        let request = position.current_position(true);
        let fix = match tokio::time::timeout(self.gps_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(PositionError::Timeout),
        };

        let coordinates = match fix {
            Ok(coordinates) => coordinates,
            Err(e) => {
                debug!("GPS upgrade skipped: {}", e);
                visit.gps_allowed = false;
                return;
            }
        };

        match self.geocoder.reverse(coordinates).await {
            Ok(place) => visit.apply_gps_location(coordinates, place),
            Err(e) => {
                warn!("Reverse geocode failed, keeping IP location: {:#}", e);
                visit.gps_allowed = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::visit::{GeoPlace, IpLocation, LocationMethod, UNKNOWN_PLACE};
    use crate::services::geo::ReportedPosition;
    use crate::test_support::{FailingStore, NeverAnswers, StubGeocoder, StubIpLocator};

    fn environment() -> PageEnvironment {
        PageEnvironment {
            user_agent: "Mozilla/5.0 (Linux; Android 14) Chrome/120.0 Mobile".to_string(),
            path: "/".to_string(),
            referrer: Some("https://www.google.com/".to_string()),
            language: "en-IN".to_string(),
            screen_size: "412x915".to_string(),
        }
    }

    fn chennai() -> IpLocation {
        IpLocation {
            city: Some("Chennai".to_string()),
            country: Some("India".to_string()),
            ip: Some("49.37.1.1".to_string()),
        }
    }

    fn recorder(
        store: Arc<dyn DocumentStore>,
        ip: StubIpLocator,
        geocoder: StubGeocoder,
    ) -> VisitRecorder {
        VisitRecorder::new(store, Arc::new(ip), Arc::new(geocoder), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn records_ip_location_when_gps_is_denied() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(
            store.clone(),
            StubIpLocator::found(chennai()),
            StubGeocoder::failing(),
        );
        let session = SessionContext::new("tab");

        let id = recorder
            .record_visit(&session, environment(), &ReportedPosition::Denied, Some("49.37.1.1"))
            .await;

        assert!(id.is_some());
        assert_eq!(session.visit_id(), id.as_deref());
        let visits = store.list_visits().await.unwrap();
        assert_eq!(visits.len(), 1);
        let visit = &visits[0];
        assert_eq!(visit.city, "Chennai");
        assert_eq!(visit.method, LocationMethod::Ip);
        assert!(!visit.gps_allowed);
        assert_eq!(visit.lat, None);
        assert_eq!(visit.duration, 0);
        assert_eq!(visit.screen_size, "412x915");
    }

    #[tokio::test]
    async fn gps_overrides_ip_location() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(
            store.clone(),
            StubIpLocator::found(chennai()),
            StubGeocoder::found(GeoPlace {
                city: Some("Tiruchirappalli".to_string()),
                country: Some("India".to_string()),
            }),
        );
        let session = SessionContext::new("tab");
        let position = ReportedPosition::Granted { lat: 10.8, lng: 78.7 };

        recorder
            .record_visit(&session, environment(), &position, Some("49.37.1.1"))
            .await
            .unwrap();

        let visit = &store.list_visits().await.unwrap()[0];
        assert_eq!(visit.city, "Tiruchirappalli");
        assert_eq!(visit.method, LocationMethod::Gps);
        assert!(visit.gps_allowed);
        assert_eq!(visit.lat, Some(10.8));
        assert_eq!(visit.lng, Some(78.7));
        assert_eq!(visit.ip, "49.37.1.1");
    }

    #[tokio::test]
    async fn failed_reverse_geocode_leaves_prior_location() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(
            store.clone(),
            StubIpLocator::found(chennai()),
            StubGeocoder::failing(),
        );
        let session = SessionContext::new("tab");
        let position = ReportedPosition::Granted { lat: 10.8, lng: 78.7 };

        recorder
            .record_visit(&session, environment(), &position, Some("49.37.1.1"))
            .await
            .unwrap();

        let visit = &store.list_visits().await.unwrap()[0];
        assert_eq!(visit.city, "Chennai");
        assert_eq!(visit.method, LocationMethod::Ip);
        assert!(!visit.gps_allowed);
        assert_eq!(visit.lat, None);
    }

    #[tokio::test]
    async fn all_lookups_failing_still_writes_defaults() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(store.clone(), StubIpLocator::failing(), StubGeocoder::failing());
        let session = SessionContext::new("tab");

        recorder
            .record_visit(&session, environment(), &ReportedPosition::Unsupported, None)
            .await
            .unwrap();

        let visit = &store.list_visits().await.unwrap()[0];
        assert_eq!(visit.city, UNKNOWN_PLACE);
        assert_eq!(visit.ip, ANONYMOUS_IP);
        assert_eq!(visit.method, LocationMethod::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn gps_prompt_is_bounded_by_timeout() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(
            store.clone(),
            StubIpLocator::found(chennai()),
            StubGeocoder::found(GeoPlace::default()),
        );
        let session = SessionContext::new("tab");

        let id = recorder
            .record_visit(&session, environment(), &NeverAnswers, Some("49.37.1.1"))
            .await;

        assert!(id.is_some());
        let visit = &store.list_visits().await.unwrap()[0];
        assert!(!visit.gps_allowed);
        assert_eq!(visit.city, "Chennai");
    }

    #[tokio::test]
    async fn repeated_invocation_writes_once() {
        let store = Arc::new(MemoryStore::new());
        let ip = StubIpLocator::found(chennai());
        let calls = ip.calls.clone();
        let recorder = recorder(store.clone(), ip, StubGeocoder::failing());
        let session = SessionContext::new("tab");

        let denied = ReportedPosition::Denied;
        let (a, b) = tokio::join!(
            recorder.record_visit(&session, environment(), &denied, Some("1.1.1.1")),
            recorder.record_visit(&session, environment(), &denied, Some("1.1.1.1")),
        );
        let c = recorder
            .record_visit(&session, environment(), &ReportedPosition::Denied, Some("1.1.1.1"))
            .await;

        assert_eq!([a.is_some(), b.is_some(), c.is_some()].iter().filter(|x| **x).count(), 1);
        assert_eq!(store.list_visits().await.unwrap().len(), 1);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_write_returns_none_without_marking_session() {
        let recorder = recorder(
            Arc::new(FailingStore),
            StubIpLocator::found(chennai()),
            StubGeocoder::failing(),
        );
        let session = SessionContext::new("tab");

        let id = recorder
            .record_visit(&session, environment(), &ReportedPosition::Denied, Some("1.1.1.1"))
            .await;

        assert!(id.is_none());
        assert!(!session.is_logged());
    }

    #[tokio::test]
    async fn hashes_ip_when_configured() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(
            store.clone(),
            StubIpLocator::found(chennai()),
            StubGeocoder::failing(),
        )
        .with_ip_hashing("salt");
        let session = SessionContext::new("tab");

        recorder
            .record_visit(&session, environment(), &ReportedPosition::Denied, Some("49.37.1.1"))
            .await
            .unwrap();

        let visit = &store.list_visits().await.unwrap()[0];
        assert_eq!(visit.ip, hash_ip("49.37.1.1", "salt"));
    }
}

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DocumentStore;
use crate::services::geo::{IpLocator, ReverseGeocoder};
use crate::services::heartbeat::Heartbeat;
use crate::services::leads::LeadCapture;
use crate::services::recorder::VisitRecorder;
use crate::services::session::SessionRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub recorder: VisitRecorder,
    pub heartbeat: Arc<Heartbeat>,
    pub leads: LeadCapture,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        ip_locator: Arc<dyn IpLocator>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        let mut recorder =
            VisitRecorder::new(store.clone(), ip_locator, geocoder, config.gps_timeout);
        if config.hash_visitor_ips {
            recorder = recorder.with_ip_hashing(config.ip_hash_salt.clone());
        }

        let heartbeat = Arc::new(Heartbeat::new(
            store.clone(),
            config.heartbeat_interval,
            config.session_max_age,
        ));
        let leads = LeadCapture::new(store.clone(), &config.handoff_phone, &config.owner_name);
        let sessions = SessionRegistry::new(config.session_idle_timeout, config.session_max_age);

        Self {
            config,
            store,
            recorder,
            heartbeat,
            leads,
            sessions,
        }
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use moka::policy::Expiry;
use moka::sync::Cache;
use nanoid::nanoid;
use tokio::sync::oneshot;

/// Per-tab state shared by the recorder and the heartbeat.
///
/// `capture_started` is claimed before any await so a double mount cannot
/// start two captures. `visit_id` is written once, after the store write,
/// and doubles as the "already logged" marker.
#[derive(Debug)]
pub struct SessionContext {
    session_id: String,
    capture_started: AtomicBool,
    visit_id: OnceLock<String>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            capture_started: AtomicBool::new(false),
            visit_id: OnceLock::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns true for exactly one caller over the session's lifetime
    pub fn try_begin_capture(&self) -> bool {
        !self.capture_started.swap(true, Ordering::SeqCst)
    }

    pub fn is_logged(&self) -> bool {
        self.visit_id.get().is_some()
    }

    pub fn visit_id(&self) -> Option<&str> {
        self.visit_id.get().map(String::as_str)
    }

    pub fn mark_logged(&self, visit_id: String) -> bool {
        self.visit_id.set(visit_id).is_ok()
    }
}

/// Sessions are capped so an unauthenticated caller cannot grow the registry without bound
const MAX_OPEN_SESSIONS: u64 = 100_000;

struct SessionEntry {
    context: Arc<SessionContext>,
    heartbeat_stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl SessionEntry {
    fn has_heartbeat(&self) -> bool {
        self.heartbeat_stop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

/// Sessions that never post a visit expire after `pending`; once a heartbeat
/// is attached the entry lives for `max_age`.
struct SessionExpiry {
    pending: Duration,
    max_age: Duration,
}

impl Expiry<String, Arc<SessionEntry>> for SessionExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        _value: &Arc<SessionEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.pending)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Arc<SessionEntry>,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        if value.has_heartbeat() {
            Some(self.max_age)
        } else {
            duration_until_expiry
        }
    }
}

/// Open browser sessions, keyed by the id handed to the page.
///
/// Dropping an evicted entry drops its heartbeat stop handle, which ends the
/// heartbeat loop as well.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Cache<String, Arc<SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(pending: Duration, max_age: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_OPEN_SESSIONS)
            .expire_after(SessionExpiry { pending, max_age })
            .build();
        Self { sessions }
    }

    pub fn open(&self) -> Arc<SessionContext> {
        let context = Arc::new(SessionContext::new(nanoid!()));
        self.sessions.insert(
            context.session_id().to_string(),
            Arc::new(SessionEntry {
                context: context.clone(),
                heartbeat_stop: Mutex::new(None),
            }),
        );
        context
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionContext>> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.context.clone())
    }

    /// Store the stop handle of the session's heartbeat. Fails if the session
    /// is gone or already has one.
    pub fn attach_heartbeat(&self, session_id: &str, stop: oneshot::Sender<()>) -> bool {
        let Some(entry) = self.sessions.get(session_id) else {
            return false;
        };

        {
            let mut slot = entry.heartbeat_stop.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_some() {
                return false;
            }
            *slot = Some(stop);
        }

        // Re-insert so the expiry switches to the heartbeat lifetime
        self.sessions.insert(session_id.to_string(), entry);
        true
    }

    /// Forget the session and stop its heartbeat
    pub fn close(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some(entry) => {
                let stop = entry
                    .heartbeat_stop
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .take();
                if let Some(stop) = stop {
                    let _ = stop.send(());
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count() as usize
    }
}

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};

use crate::db::DocumentStore;
use crate::services::session::{SessionContext, SessionRegistry};

/// Extends a visit's recorded duration while its tab stays open
pub struct Heartbeat {
    store: Arc<dyn DocumentStore>,
    interval: Duration,
    max_age: Duration,
}

impl Heartbeat {
    pub fn new(store: Arc<dyn DocumentStore>, interval: Duration, max_age: Duration) -> Self {
        Self {
            store,
            interval,
            max_age,
        }
    }

    /// One beat. No-op (false) until the session holds a visit id.
    pub async fn tick(&self, session: &SessionContext) -> bool {
        let Some(visit_id) = session.visit_id() else {
            return false;
        };

        match self
            .store
            .extend_visit(visit_id, self.interval.as_secs() as i64)
            .await
        {
            Ok(()) => {
                debug!("Heartbeat for visit {}", visit_id);
                true
            }
            Err(e) => {
                warn!("Heartbeat for visit {} failed: {:#}", visit_id, e);
                false
            }
        }
    }

    /// Beat every interval until `stop` fires (or its sender is dropped) or the
    /// session reaches its maximum age. Returns the number of successful beats.
    pub async fn run(&self, session: Arc<SessionContext>, mut stop: oneshot::Receiver<()>) -> u64 {
        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expiry = tokio::time::sleep_until(start + self.max_age);
        tokio::pin!(expiry);

        let mut beats = 0;
        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = &mut expiry => {
                    info!("Session {} reached its maximum age", session.session_id());
                    break;
                }
                _ = ticker.tick() => {
                    if self.tick(&session).await {
                        beats += 1;
                    }
                }
            }
        }
        beats
    }

    /// Run the heartbeat in the background and register its stop handle.
    /// The session is dropped from the registry when the loop ends.
    pub fn spawn(
        self: &Arc<Self>,
        registry: &SessionRegistry,
        session: Arc<SessionContext>,
    ) -> bool {
        let (stop_tx, stop_rx) = oneshot::channel();
        if !registry.attach_heartbeat(session.session_id(), stop_tx) {
            return false;
        }

        let heartbeat = Arc::clone(self);
        let registry = registry.clone();
        tokio::spawn(async move {
            let beats = heartbeat.run(session.clone(), stop_rx).await;
            debug!(
                "Heartbeat for session {} ended after {} beats",
                session.session_id(),
                beats
            );
            registry.close(session.session_id());
        });
        true
    }
}

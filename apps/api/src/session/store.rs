use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::recommendation::Recommender;
use crate::search::JobSearcher;
use crate::session::SearchSession;

/// In-memory registry of live sessions. Nothing is persisted.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SearchSession>>>,
    searcher: Arc<dyn JobSearcher>,
    recommender: Arc<dyn Recommender>,
}

impl SessionStore {
    pub fn new(searcher: Arc<dyn JobSearcher>, recommender: Arc<dyn Recommender>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            searcher,
            recommender,
        }
    }

    pub fn create(&self) -> Arc<SearchSession> {
        let session = Arc::new(SearchSession::new(
            self.searcher.clone(),
            self.recommender.clone(),
        ));
        let mut sessions = self.sessions.write();
        sessions.insert(session.id(), session.clone());
        info!("Session {} created ({} live)", session.id(), sessions.len());
        session
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<SearchSession>> {
        self.sessions.read().get(&id).cloned()
    }

    /// Drops a session. Requests already holding it run to completion.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            info!("Session {} removed", id);
        }
        removed
    }

    /// Removes sessions that have been idle for at least `ttl`. Sessions with
    /// a request in flight are kept. Returns the number removed.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| match session.idle_since() {
            Some(since) => (now - since).to_std().map_or(true, |idle| idle < ttl),
            None => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle sessions ({} live)", evicted, sessions.len());
        }
        evicted
    }
}

/// Sweeps idle sessions out of `store` every `every` until the runtime stops.
pub fn spawn_idle_sweep(store: Arc<SessionStore>, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            store.evict_idle(ttl);
        }
    })
}

use crate::config::Config;
use crate::fetcher::HttpSource;
use crate::session::CalendarSession;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::Mutex;
use tracing::debug;

pub type Session = CalendarSession<HttpSource>;

// Oldest sessions are dropped past this many; abandoned calendars never close.
const MAX_SESSIONS: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    source: Arc<HttpSource>,
    sessions: Arc<Mutex<BTreeMap<u64, Arc<Session>>>>,
    next_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, source: HttpSource) -> Self {
        Self {
            config: Arc::new(config),
            source: Arc::new(source),
            sessions: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn open_session(&self) -> (u64, Arc<Session>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(
            Arc::clone(&self.source),
            self.config.endpoints.clone(),
            self.config.retry,
        ));

        let mut sessions = self.sessions.lock().await;
        while sessions.len() >= MAX_SESSIONS {
            if let Some((evicted, _)) = sessions.pop_first() {
                debug!("evicting calendar session {evicted}");
            }
        }
        sessions.insert(id, Arc::clone(&session));
        debug!("opened calendar session {id}");

        (id, session)
    }

    pub async fn session(&self, id: u64) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(&id).cloned()
    }

    /// Swaps the session for a fresh one under the same id.
    pub async fn reset_session(&self, id: u64) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id)?;
        *entry = Arc::new(entry.fresh());
        debug!("reset calendar session {id}");
        Some(Arc::clone(entry))
    }

    pub async fn close_session(&self, id: u64) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }
}

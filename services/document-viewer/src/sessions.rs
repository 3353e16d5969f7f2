//! Session Registry
//!
//! Keeps one viewer per browser session in memory. Sessions nobody has
//! touched for the configured idle time are dropped by [`SessionRegistry::evict_idle`].

use baa_scanner::{SearchPipeline, ViewerSession};
use baa_utils::{BaaError, BaaResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

struct SessionEntry {
    session: ViewerSession,
    last_seen: Instant,
}

/// Viewer sessions by id
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    pipeline: SearchPipeline,
    highlight_deferral: Duration,
}

impl SessionRegistry {
    pub fn new(pipeline: SearchPipeline, highlight_deferral: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            pipeline,
            highlight_deferral,
        }
    }

    /// Open a fresh viewer
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let session = ViewerSession::new(self.pipeline.clone(), self.highlight_deferral);

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            SessionEntry {
                session,
                last_seen: Instant::now(),
            },
        );

        id
    }

    /// Get viewer by ID, marking it as in use
    pub async fn get(&self, id: Uuid) -> BaaResult<ViewerSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| BaaError::not_found(format!("session {}", id)))?;

        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> BaaResult<()> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| BaaError::not_found(format!("session {}", id)))?;

        entry.session.close();
        Ok(())
    }

    /// Drops every session unused for longer than `idle`. Returns how many went.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, entry| {
            let keep = entry.last_seen.elapsed() <= idle;
            if !keep {
                info!(session = %id, "Evicting idle session");
                entry.session.close();
            }
            keep
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

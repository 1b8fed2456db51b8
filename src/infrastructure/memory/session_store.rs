use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::domain::session::model::Session;
use crate::domain::session::repository::SessionStore;
use crate::domain::usuario::model::Usuario;
use crate::infrastructure::http::backend_client::BackendClient;
use crate::utils::errors::ApiError;

pub const DEFAULT_IDLE_TTL: std::time::Duration = std::time::Duration::from_secs(8 * 60 * 60);

pub struct InMemorySessionStore {
    client: BackendClient,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    idle_ttl: Duration,
}

impl InMemorySessionStore {

    pub fn new(client: BackendClient) -> Self {
        InMemorySessionStore {
            client,
            sessions: RwLock::new(HashMap::new()),
            idle_ttl: Duration::seconds(DEFAULT_IDLE_TTL.as_secs() as i64),
        }
    }

    /// Sessions unused for longer than `ttl` are dropped on purge.
    pub fn with_idle_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.idle_ttl = Duration::from_std(ttl).unwrap_or(self.idle_ttl);
        self
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {

    async fn create(&self, token: String, usuario: Usuario) -> Result<Arc<Session>, ApiError> {
        let session = Arc::new(Session::new(token, usuario, self.client.clone()));
        self.sessions
            .write()
            .insert(session.id.to_string(), Arc::clone(&session));
        log::info!("Session {} opened for {}", session.id, session.usuario().email);
        Ok(session)
    }

    async fn get(&self, id: &str) -> Result<Option<Arc<Session>>, ApiError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn replace_user(&self, id: &str, usuario: Usuario) -> Result<bool, ApiError> {
        match self.sessions.read().get(id) {
            Some(session) => {
                session.set_usuario(usuario);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, ApiError> {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            log::info!("Session {} closed", id);
        }
        Ok(removed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        let idle_ttl = self.idle_ttl;
        sessions.retain(|_, session| !session.is_expired(now) && !session.is_idle(now, idle_ttl));
        let purged = before - sessions.len();
        if purged > 0 {
            log::info!("Purged {} expired or idle sessions", purged);
        }
        Ok(purged)
    }
}

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::usuario::model::{Rol, Usuario};
use crate::infrastructure::http::backend_client::BackendClient;
use crate::services::data_loader::DataLoader;
use crate::services::notifications::NotificationSystem;
use crate::utils::security::token::TokenInspector;

/// Server-side half of a signed-in browser: the clinic API token, the user it
/// belongs to, and the per-session cache and notification queue.
pub struct Session {
    pub id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub notifications: Arc<NotificationSystem>,
    pub loader: DataLoader,
    usuario: RwLock<Usuario>,
    last_seen: RwLock<DateTime<Utc>>,
}

impl Session {

    pub fn new(token: String, usuario: Usuario, client: BackendClient) -> Self {
        let notifications = Arc::new(NotificationSystem::new());
        let loader = DataLoader::new(client, Arc::clone(&notifications));

        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            token,
            created_at: now,
            notifications,
            loader,
            usuario: RwLock::new(usuario),
            last_seen: RwLock::new(now),
        }
    }

    pub fn usuario(&self) -> Usuario {
        self.usuario.read().clone()
    }

    pub fn rol(&self) -> Rol {
        self.usuario.read().rol
    }

    pub fn set_usuario(&self, usuario: Usuario) {
        *self.usuario.write() = usuario;
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        TokenInspector::expires_at(&self.token)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        TokenInspector::is_expired(&self.token, now)
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.read()
    }

    pub fn touch(&self, now: DateTime<Utc>) {
        let mut last_seen = self.last_seen.write();
        if now > *last_seen {
            *last_seen = now;
        }
    }

    /// Unused for longer than `ttl`. Independent of the token, which may never expire.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_seen() > ttl
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::session::model::Session;
use crate::domain::usuario::model::Usuario;
use crate::utils::errors::ApiError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, token: String, usuario: Usuario) -> Result<Arc<Session>, ApiError>;
    async fn get(&self, id: &str) -> Result<Option<Arc<Session>>, ApiError>;
    async fn replace_user(&self, id: &str, usuario: Usuario) -> Result<bool, ApiError>;
    async fn remove(&self, id: &str) -> Result<bool, ApiError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, ApiError>;
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
#[cfg(test)]
use serde_json::Value;

use crate::domain::cita::model::Cita;
use crate::domain::historial::model::Historial;
use crate::domain::mascota::model::Mascota;
use crate::domain::usuario::model::{Rol, Usuario};
use crate::infrastructure::http::backend_client::{ApiEnvelope, BackendClient, SESSION_EXPIRED};
use crate::infrastructure::http::endpoints::{CITAS, HISTORIALES, MASCOTAS, USUARIOS};
use crate::services::notifications::NotificationSystem;
use crate::utils::errors::ApiError;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub use_cache: bool,
    pub show_loading: bool,
    pub error_message: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            use_cache: true,
            show_loading: false,
            error_message: "Error al cargar datos".to_string(),
        }
    }
}

impl LoadOptions {

    pub fn with_error(message: &str) -> Self {
        LoadOptions {
            error_message: message.to_string(),
            ..Default::default()
        }
    }
}

struct InFlight<'a> {
    loading: &'a Mutex<HashSet<String>>,
    endpoint: String,
}

impl<'a> Drop for InFlight<'a> {
    fn drop(&mut self) {
        self.loading.lock().remove(&self.endpoint);
    }
}

/// Per-session cache of clinic API reads.
pub struct DataLoader {
    client: BackendClient,
    notifications: Arc<NotificationSystem>,
    cache: Mutex<HashMap<String, ApiEnvelope>>,
    loading: Mutex<HashSet<String>>,
}

impl DataLoader {

    pub fn new(client: BackendClient, notifications: Arc<NotificationSystem>) -> Self {
        DataLoader {
            client,
            notifications,
            cache: Mutex::new(HashMap::new()),
            loading: Mutex::new(HashSet::new()),
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn is_loading(&self, endpoint: &str) -> bool {
        self.loading.lock().contains(endpoint)
    }

    pub fn get_cached_data(&self, endpoint: &str) -> Option<ApiEnvelope> {
        self.cache.lock().get(endpoint).cloned()
    }

    fn begin(&self, endpoint: &str) -> Result<InFlight<'_>, ApiError> {
        let mut loading = self.loading.lock();
        if !loading.insert(endpoint.to_string()) {
            log::debug!("Already loading: {}", endpoint);
            return Err(ApiError::AlreadyLoading(endpoint.to_string()));
        }
        Ok(InFlight { loading: &self.loading, endpoint: endpoint.to_string() })
    }

    pub async fn load_data(&self, token: &str, endpoint: &str, options: LoadOptions) -> Result<ApiEnvelope, ApiError> {
        let guard = self.begin(endpoint)?;

        if options.use_cache {
            if let Some(cached) = self.get_cached_data(endpoint) {
                log::debug!("Served from cache: {}", endpoint);
                return Ok(cached);
            }
        }

        if options.show_loading {
            self.notifications.info("Cargando datos...");
        }

        let result = self
            .client
            .get(endpoint, Some(token))
            .await
            .and_then(|envelope| envelope.into_success(&options.error_message));
        drop(guard);

        match result {
            Ok(envelope) => {
                if options.use_cache {
                    self.cache.lock().insert(endpoint.to_string(), envelope.clone());
                }
                log::debug!("Loaded: {}", endpoint);
                Ok(envelope)
            },
            Err(e) => {
                log::error!("Failed to load {}: {}", endpoint, e);
                self.notify_error(&e, &options.error_message);
                Err(e)
            }
        }
    }

    fn notify_error(&self, error: &ApiError, fallback: &str) {
        let message = match error {
            ApiError::Unauthorized(_) => SESSION_EXPIRED.to_string(),
            ApiError::Network(_) => format!(
                "Error de conexión. Verifica que la API esté funcionando en {}",
                self.client.base_url()
            ),
            ApiError::AlreadyLoading(_) => return,
            other => {
                let message = other.message();
                if message.is_empty() { fallback.to_string() } else { message }
            }
        };
        self.notifications.error(message);
    }

    async fn load_list<T: DeserializeOwned>(
        &self,
        token: &str,
        endpoint: &str,
        key: &str,
        error_message: &str,
        empty_message: &str,
        loaded_noun: &str,
    ) -> Result<Vec<T>, ApiError> {
        let envelope = self.load_data(token, endpoint, LoadOptions::with_error(error_message)).await?;
        let items: Vec<T> = envelope.list(key)?;

        if items.is_empty() {
            self.notifications.info(empty_message);
        } else {
            self.notifications.success(format!("{} {}", items.len(), loaded_noun));
        }

        Ok(items)
    }

    pub async fn load_mascotas(&self, token: &str) -> Result<Vec<Mascota>, ApiError> {
        self.load_list(token, MASCOTAS, "mascotas", "Error al cargar las mascotas", "No hay mascotas registradas", "mascotas cargadas").await
    }

    pub async fn load_citas(&self, token: &str) -> Result<Vec<Cita>, ApiError> {
        self.load_list(token, CITAS, "citas", "Error al cargar las citas", "No hay citas programadas", "citas cargadas").await
    }

    pub async fn load_historiales(&self, token: &str) -> Result<Vec<Historial>, ApiError> {
        self.load_list(token, HISTORIALES, "historiales", "Error al cargar los historiales médicos", "No hay historiales médicos registrados", "historiales cargados").await
    }

    pub async fn load_usuarios(&self, token: &str) -> Result<Vec<Usuario>, ApiError> {
        self.load_list(token, USUARIOS, "usuarios", "Error al cargar los usuarios", "No hay usuarios registrados", "usuarios cargados").await
    }

    pub async fn load_veterinarios(&self, token: &str) -> Result<Vec<Usuario>, ApiError> {
        let usuarios = self.load_usuarios(token).await?;
        Ok(usuarios.into_iter().filter(|u| u.rol == Rol::Veterinario).collect())
    }

    pub async fn create_data<T: Serialize>(&self, token: &str, endpoint: &str, body: &T, success_message: &str) -> Result<ApiEnvelope, ApiError> {
        let result = self.client.post(endpoint, Some(token), body).await;
        self.record_write(endpoint, result, success_message, "Error al guardar los datos")
    }

    pub async fn update_data<T: Serialize>(&self, token: &str, endpoint: &str, body: &T, success_message: &str) -> Result<ApiEnvelope, ApiError> {
        let result = self.client.put(endpoint, Some(token), body).await;
        self.record_write(endpoint, result, success_message, "Error al actualizar los datos")
    }

    pub async fn delete_data(&self, token: &str, endpoint: &str, success_message: &str) -> Result<ApiEnvelope, ApiError> {
        let result = self.client.delete(endpoint, Some(token)).await;
        self.record_write(endpoint, result, success_message, "Error al eliminar los datos")
    }

    /// Writes report their own success; failures are left to the caller,
    /// which knows the context for the error wording. `endpoint` is the
    /// collection whose cache is invalidated.
    pub fn record_write(
        &self,
        endpoint: &str,
        result: Result<ApiEnvelope, ApiError>,
        success_message: &str,
        failure_message: &str,
    ) -> Result<ApiEnvelope, ApiError> {
        let envelope = result?.into_success(failure_message)?;

        self.notifications.success(success_message);
        self.clear_cache(Some(endpoint));
        Ok(envelope)
    }

    /// Drops every cached key that shares the first path segment of `endpoint`.
    pub fn clear_cache(&self, endpoint: Option<&str>) {
        let mut cache = self.cache.lock();
        match endpoint {
            Some(endpoint) => {
                let segment = endpoint.split('/').nth(1).unwrap_or("");
                if segment.is_empty() {
                    cache.clear();
                } else {
                    cache.retain(|key, _| !key.contains(segment));
                }
            },
            None => cache.clear(),
        }
    }

    pub fn cached_endpoints(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.cache.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[cfg(test)]
    fn store(&self, endpoint: &str, body: Value) {
        self.cache.lock().insert(endpoint.to_string(), ApiEnvelope::new(body));
    }
}

use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::common::RecordId;
use crate::domain::usuario::model::{LoginForm, PasswordChange, Usuario};
use crate::infrastructure::http::backend_client::{ApiEnvelope, BackendClient};
use crate::utils::errors::ApiError;

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_REGISTRO: &str = "/auth/registro";
pub const AUTH_PERFIL: &str = "/auth/perfil";
pub const USUARIOS: &str = "/usuarios";
pub const MASCOTAS: &str = "/mascotas";
pub const CITAS: &str = "/citas";
pub const HISTORIALES: &str = "/historiales";
pub const HEALTH: &str = "/health";

pub fn item_path(base: &str, id: &RecordId) -> String {
    format!("{}/{}", base, id)
}

/// CRUD group over one collection of the clinic API.
#[derive(Clone, Copy)]
pub struct Resource<'a> {
    client: &'a BackendClient,
    base: &'static str,
}

impl<'a> Resource<'a> {

    pub fn path(&self) -> &'static str {
        self.base
    }

    pub async fn get_all(&self, token: &str) -> Result<ApiEnvelope, ApiError> {
        self.client.get(self.base, Some(token)).await
    }

    pub async fn get_by_id(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.client.get(&item_path(self.base, id), Some(token)).await
    }

    pub async fn create<T: Serialize>(&self, token: &str, body: &T) -> Result<ApiEnvelope, ApiError> {
        self.client.post(self.base, Some(token), body).await
    }

    pub async fn update<T: Serialize>(&self, token: &str, id: &RecordId, body: &T) -> Result<ApiEnvelope, ApiError> {
        self.client.put(&item_path(self.base, id), Some(token), body).await
    }

    pub async fn delete(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.client.delete(&item_path(self.base, id), Some(token)).await
    }
}

pub struct UsuariosApi<'a> {
    resource: Resource<'a>,
}

impl<'a> UsuariosApi<'a> {

    pub async fn get_all(&self, token: &str) -> Result<ApiEnvelope, ApiError> {
        self.resource.get_all(token).await
    }

    pub async fn get_by_id(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.resource.get_by_id(token, id).await
    }

    /// Users are created through the registration endpoint.
    pub async fn create<T: Serialize>(&self, token: &str, body: &T) -> Result<ApiEnvelope, ApiError> {
        self.resource.client.post(AUTH_REGISTRO, Some(token), body).await
    }

    pub async fn update<T: Serialize>(&self, token: &str, id: &RecordId, body: &T) -> Result<ApiEnvelope, ApiError> {
        self.resource.update(token, id, body).await
    }

    pub async fn delete(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.resource.delete(token, id).await
    }

    pub async fn change_password(&self, token: &str, id: &RecordId, change: &PasswordChange) -> Result<ApiEnvelope, ApiError> {
        let endpoint = format!("{}/password", item_path(USUARIOS, id));
        self.resource.client.put(&endpoint, Some(token), change).await
    }
}

pub struct CitasApi<'a> {
    resource: Resource<'a>,
}

impl<'a> CitasApi<'a> {

    pub async fn get_all(&self, token: &str) -> Result<ApiEnvelope, ApiError> {
        self.resource.get_all(token).await
    }

    pub async fn get_by_id(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.resource.get_by_id(token, id).await
    }

    pub async fn create<T: Serialize>(&self, token: &str, body: &T) -> Result<ApiEnvelope, ApiError> {
        self.resource.create(token, body).await
    }

    pub async fn update<T: Serialize>(&self, token: &str, id: &RecordId, body: &T) -> Result<ApiEnvelope, ApiError> {
        self.resource.update(token, id, body).await
    }

    pub async fn delete(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.resource.delete(token, id).await
    }

    pub async fn cancel(&self, token: &str, id: &RecordId) -> Result<ApiEnvelope, ApiError> {
        self.resource.update(token, id, &json!({ "estado": "cancelada" })).await
    }
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub usuario: Usuario,
}

pub struct AuthApi<'a> {
    client: &'a BackendClient,
}

impl<'a> AuthApi<'a> {

    /// Bad credentials come back as 401, which would otherwise read as an
    /// expired session.
    pub async fn login(&self, credentials: &LoginForm) -> Result<LoginResult, ApiError> {
        let envelope = match self.client.post(AUTH_LOGIN, None, credentials).await {
            Ok(envelope) => envelope,
            Err(ApiError::Unauthorized(_)) => {
                return Err(ApiError::Unauthorized("Credenciales inválidas".to_string()))
            },
            Err(e) => return Err(e),
        };

        let failure = || {
            ApiError::Unauthorized(envelope.message().unwrap_or_else(|| "Error en el login".to_string()))
        };

        if !envelope.success() {
            return Err(failure());
        }

        let token = envelope
            .field("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(failure)?;

        let usuario = Self::read_usuario(&envelope).ok_or_else(failure)?;

        Ok(LoginResult { token, usuario })
    }

    pub async fn register<T: Serialize>(&self, form: &T) -> Result<ApiEnvelope, ApiError> {
        let envelope = self.client.post(AUTH_REGISTRO, None, form).await?;
        if !envelope.success() {
            return Err(ApiError::BadRequest(
                envelope.message().unwrap_or_else(|| "Error en el registro".to_string()),
            ));
        }
        Ok(envelope)
    }

    pub async fn profile(&self, token: &str) -> Result<Usuario, ApiError> {
        let envelope = self.client.get(AUTH_PERFIL, Some(token)).await?;
        match Self::read_usuario(&envelope) {
            Some(usuario) if envelope.success() => Ok(usuario),
            _ => Err(ApiError::InvalidData("Error al obtener perfil".to_string())),
        }
    }

    /// The API sends the user as `usuario` or `user`.
    fn read_usuario(envelope: &ApiEnvelope) -> Option<Usuario> {
        envelope
            .field("usuario")
            .or_else(|| envelope.field("user"))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl BackendClient {

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    pub fn usuarios(&self) -> UsuariosApi<'_> {
        UsuariosApi { resource: Resource { client: self, base: USUARIOS } }
    }

    pub fn mascotas(&self) -> Resource<'_> {
        Resource { client: self, base: MASCOTAS }
    }

    pub fn citas(&self) -> CitasApi<'_> {
        CitasApi { resource: Resource { client: self, base: CITAS } }
    }

    pub fn historiales(&self) -> Resource<'_> {
        Resource { client: self, base: HISTORIALES }
    }

    pub async fn health(&self) -> Result<ApiEnvelope, ApiError> {
        self.get(HEALTH, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_item_path() {
        assert_eq!(item_path(MASCOTAS, &RecordId::new("7")), "/mascotas/7");
        assert_eq!(item_path(USUARIOS, &RecordId::new("65af")), "/usuarios/65af");
    }

    #[test]
    fn test_groups_point_at_their_collections() {
        let client = BackendClient::init("http://localhost:3000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(client.mascotas().path(), "/mascotas");
        assert_eq!(client.historiales().path(), "/historiales");
        assert_eq!(client.citas().resource.path(), "/citas");
        assert_eq!(client.usuarios().resource.path(), "/usuarios");
    }

    #[test]
    fn test_read_usuario_accepts_user_key() {
        let envelope = ApiEnvelope::new(serde_json::json!({
            "success": true,
            "token": "t",
            "user": { "id": 1, "nombre": "Ana", "email": "ana@patitas.com", "rol": "admin" }
        }));

        let usuario = AuthApi::read_usuario(&envelope).unwrap();
        assert_eq!(usuario.nombre, "Ana");
    }
}

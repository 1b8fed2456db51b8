use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::utils::errors::ApiError;

fn url_pattern() -> Result<&'static Regex, ApiError> {
    static URL_PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    URL_PATTERN
        .get_or_init(|| Regex::new(r"^https?://[^/\s]+(/.*)?$"))
        .as_ref()
        .map_err(|e| ApiError::InternalServerError(e.to_string()))
}

pub const SESSION_EXPIRED: &str = "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.";
pub const CONNECTION_ERROR: &str = "Error de conexión";

/// Normalised clinic API response. Always an object with a `success` flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ApiEnvelope {
    body: Value,
}

impl ApiEnvelope {

    pub fn new(body: Value) -> Self {
        ApiEnvelope { body }
    }

    pub fn success(&self) -> bool {
        self.body.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn message(&self) -> Option<String> {
        ["message", "msg"]
            .iter()
            .find_map(|key| self.body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// A 2xx answer can still carry `success: false`; that becomes a
    /// `BadRequest` with the API's message, or `fallback`.
    pub fn into_success(self, fallback: &str) -> Result<ApiEnvelope, ApiError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ApiError::BadRequest(self.message().unwrap_or_else(|| fallback.to_string())))
        }
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// `body[key]`, then `body.data`, then a bare array. Anything else is empty.
    pub fn list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, ApiError> {
        let found = [self.body.get(key), self.body.get("data"), Some(&self.body)]
            .into_iter()
            .flatten()
            .find(|value| value.is_array());

        match found {
            Some(array) => Ok(serde_json::from_value(array.clone())?),
            None => Ok(Vec::new()),
        }
    }

    /// `body[key]`, then `body.data`, then the body itself.
    pub fn item<T: DeserializeOwned>(&self, key: &str) -> Result<T, ApiError> {
        let found = [self.body.get(key), self.body.get("data")]
            .into_iter()
            .flatten()
            .find(|value| value.is_object())
            .unwrap_or(&self.body);

        Ok(serde_json::from_value(found.clone())?)
    }

    /// Looks a field up on the body, then on `body.data`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body
            .get(key)
            .or_else(|| self.body.get("data").and_then(|data| data.get(key)))
            .filter(|value| !value.is_null())
    }
}

pub fn handle_api_response(status: StatusCode, text: &str) -> Result<ApiEnvelope, ApiError> {
    if status == StatusCode::NO_CONTENT {
        return Ok(ApiEnvelope::new(json!({ "success": true })));
    }

    if status.is_success() {
        let envelope = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) if map.contains_key("success") => Value::Object(map),
            Ok(data) => json!({ "success": true, "data": data }),
            Err(_) => json!({ "success": true, "message": text }),
        };
        return Ok(ApiEnvelope::new(envelope));
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(SESSION_EXPIRED.to_string()));
    }

    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| {
            ["msg", "message"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or(""))
        });

    Err(ApiError::from_status(status.as_u16(), message))
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    debug: bool,
}

impl BackendClient {

    pub fn init(base_url: &str, timeout: Duration) -> Result<BackendClient, ApiError> {
        Self::validate_base_url(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InternalServerError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(BackendClient {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            debug: false,
        })
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<ApiEnvelope, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);

        if self.debug {
            log::debug!("API request: {} {}", method, url);
        }

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("API request failed: {} {}: {}", method, url, e);
            ApiError::Network(CONNECTION_ERROR.to_string())
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            log::error!("Failed to read API response from {}: {}", url, e);
            ApiError::Network(CONNECTION_ERROR.to_string())
        })?;

        if self.debug {
            log::debug!("API response: {} {} -> {}", method, url, status.as_u16());
        }

        handle_api_response(status, &text)
    }

    pub async fn get(&self, endpoint: &str, token: Option<&str>) -> Result<ApiEnvelope, ApiError> {
        self.request(Method::GET, endpoint, token, None).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, token: Option<&str>, body: &T) -> Result<ApiEnvelope, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, endpoint, token, Some(body)).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, endpoint: &str, token: Option<&str>, body: &T) -> Result<ApiEnvelope, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, endpoint, token, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str, token: Option<&str>) -> Result<ApiEnvelope, ApiError> {
        self.request(Method::DELETE, endpoint, token, None).await
    }

    fn validate_base_url(url: &str) -> Result<(), ApiError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ApiError::BadRequest("Invalid API URL: cannot be empty or whitespace".to_string()));
        }

        if url.contains(char::is_whitespace) {
            return Err(ApiError::BadRequest("Invalid API URL: cannot contain whitespace".to_string()));
        }

        if !url_pattern()?.is_match(trimmed) {
            return Err(ApiError::BadRequest(format!(
                "Invalid API URL format. Expected http(s)://host[:port][/path]. Got: {}",
                url
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Item {
        nombre: String,
    }

    #[test]
    fn test_validate_base_url() {
        assert!(BackendClient::validate_base_url("http://localhost:3000/api").is_ok());
        assert!(BackendClient::validate_base_url("https://api.patitasfelices.com/api").is_ok());
        assert!(BackendClient::validate_base_url("http://127.0.0.1:3000").is_ok());

        assert!(BackendClient::validate_base_url("").is_err());
        assert!(BackendClient::validate_base_url("   ").is_err());
        assert!(BackendClient::validate_base_url("ftp://localhost").is_err());
        assert!(BackendClient::validate_base_url("http://").is_err());
        assert!(BackendClient::validate_base_url("http://local host/api").is_err());
        assert!(BackendClient::validate_base_url("localhost:3000").is_err());
    }

    #[test]
    fn test_into_success() {
        let ok = ApiEnvelope::new(json!({ "success": true, "mascota": { "nombre": "Luna" } }));
        assert!(ok.into_success("x").is_ok());

        let refused = ApiEnvelope::new(json!({ "success": false, "message": "Mascota no encontrada" }));
        match refused.into_success("Error al cargar la mascota") {
            Err(ApiError::BadRequest(message)) => assert_eq!(message, "Mascota no encontrada"),
            other => panic!("unexpected {:?}", other),
        }

        let silent = ApiEnvelope::new(json!({ "success": false }));
        match silent.into_success("Error al cargar la mascota") {
            Err(ApiError::BadRequest(message)) => assert_eq!(message, "Error al cargar la mascota"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_url_pattern_compiled_once() {
        let first = url_pattern().unwrap();
        let second = url_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_init_trims_trailing_slash() {
        let client = BackendClient::init("http://localhost:3000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn test_success_body_passes_through() {
        let envelope = handle_api_response(StatusCode::OK, r#"{"success":false,"message":"nada"}"#).unwrap();
        assert!(!envelope.success());
        assert_eq!(envelope.message().as_deref(), Some("nada"));
    }

    #[test]
    fn test_plain_json_is_wrapped() {
        let envelope = handle_api_response(StatusCode::CREATED, r#"[{"nombre":"Luna"}]"#).unwrap();
        assert!(envelope.success());
        assert_eq!(envelope.body()["data"][0]["nombre"], "Luna");
    }

    #[test]
    fn test_text_and_no_content() {
        let text = handle_api_response(StatusCode::OK, "pong").unwrap();
        assert_eq!(text.message().as_deref(), Some("pong"));

        let empty = handle_api_response(StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(empty.body(), &json!({ "success": true }));
    }

    #[test]
    fn test_unauthorized_is_session_expired() {
        let err = handle_api_response(StatusCode::UNAUTHORIZED, r#"{"msg":"token inválido"}"#).unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(err.message(), SESSION_EXPIRED);
    }

    #[test]
    fn test_error_message_precedence() {
        let msg = handle_api_response(StatusCode::CONFLICT, r#"{"msg":"duplicado","message":"otro"}"#).unwrap_err();
        assert!(matches!(msg, ApiError::Conflict(ref m) if m == "duplicado"));

        let message = handle_api_response(StatusCode::NOT_FOUND, r#"{"message":"no existe"}"#).unwrap_err();
        assert!(matches!(message, ApiError::NotFound(ref m) if m == "no existe"));

        let fallback = handle_api_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>").unwrap_err();
        assert!(matches!(
            fallback,
            ApiError::Upstream { status: 500, ref message } if message == "HTTP 500: Internal Server Error"
        ));
    }

    #[test]
    fn test_list_lookup_order() {
        let keyed = ApiEnvelope::new(json!({ "success": true, "mascotas": [{ "nombre": "A" }], "data": [] }));
        let data = ApiEnvelope::new(json!({ "success": true, "data": [{ "nombre": "B" }] }));
        let bare = ApiEnvelope::new(json!([{ "nombre": "C" }]));
        let none = ApiEnvelope::new(json!({ "success": true }));

        assert_eq!(keyed.list::<Item>("mascotas").unwrap()[0].nombre, "A");
        assert_eq!(data.list::<Item>("mascotas").unwrap()[0].nombre, "B");
        assert_eq!(bare.list::<Item>("mascotas").unwrap()[0].nombre, "C");
        assert!(none.list::<Item>("mascotas").unwrap().is_empty());
    }

    #[test]
    fn test_item_lookup_order() {
        let keyed = ApiEnvelope::new(json!({ "success": true, "mascota": { "nombre": "A" } }));
        let data = ApiEnvelope::new(json!({ "success": true, "data": { "nombre": "B" } }));
        let itself = ApiEnvelope::new(json!({ "success": true, "nombre": "C" }));

        assert_eq!(keyed.item::<Item>("mascota").unwrap().nombre, "A");
        assert_eq!(data.item::<Item>("mascota").unwrap().nombre, "B");
        assert_eq!(itself.item::<Item>("mascota").unwrap().nombre, "C");
    }

    #[test]
    fn test_field_checks_data() {
        let envelope = ApiEnvelope::new(json!({ "success": true, "data": { "token": "abc" } }));
        assert_eq!(envelope.field("token").and_then(Value::as_str), Some("abc"));
        assert!(envelope.field("usuario").is_none());
    }
}

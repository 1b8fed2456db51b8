pub mod auth_handlers;
pub mod cita_handlers;
pub mod dashboard_handlers;
pub mod historial_handlers;
pub mod mascota_handlers;
pub mod misc_handlers;
pub mod perfil_handlers;
pub mod usuario_handlers;

use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError};
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;

use crate::api::state::AppState;
use crate::domain::session::model::Session;
use crate::services::navigation::NO_PERMISSION;
use crate::services::notifications::{api_error_notice, Notification};
use crate::utils::errors::ApiError;

/// Body of every private response.
#[derive(Serialize)]
pub struct Screen<T: Serialize> {
    pub data: T,
    pub notifications: Vec<Notification>,
}

pub fn screen<T: Serialize>(session: &Session, data: T) -> HttpResponse {
    screen_with(HttpResponse::Ok(), session, data)
}

pub fn screen_with<T: Serialize>(mut builder: HttpResponseBuilder, session: &Session, data: T) -> HttpResponse {
    builder.json(Screen {
        data,
        notifications: session.notifications.take_visible(Utc::now()),
    })
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn require(allowed: bool) -> Result<(), ApiError> {
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden(NO_PERMISSION.to_string()))
    }
}

/// Reports a failed action as a toast worded for `context`, then answers with
/// the error body.
pub async fn failure(state: &AppState, session: &Session, context: &str, action: &str, error: ApiError) -> HttpResponse {
    if let Some(notice) = api_error_notice(context, action, &error) {
        session.notifications.error(notice);
    }
    reply_error(state, session, error).await
}

/// For loader failures, which already queued their own toast.
pub async fn load_failure(state: &AppState, session: &Session, error: ApiError) -> HttpResponse {
    reply_error(state, session, error).await
}

async fn reply_error(state: &AppState, session: &Session, error: ApiError) -> HttpResponse {
    log::warn!("Request for {} failed: {}", session.usuario().email, error);

    let mut body = error.to_json();
    body["notifications"] = json!(session.notifications.take_visible(Utc::now()));

    let mut builder = HttpResponse::build(error.status_code());
    if error.is_session_expired() {
        if let Err(e) = state.sessions.remove(&session.id.to_string()).await {
            log::error!("Could not drop session {}: {}", session.id, e);
        }
        builder.cookie(state.expired_session_cookie());
    }
    builder.json(body)
}

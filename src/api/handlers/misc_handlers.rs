use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::api::handlers::{load_failure, screen};
use crate::api::state::AppState;
use crate::services::navigation::{mark_active, protect_page, Navigation, Page};
use crate::services::permissions::menu_for;
use crate::utils::errors::ApiError;
use crate::utils::security::CurrentSession;

pub async fn index() -> impl Responder {
    "Patitas Felices. Inicia sesión en /auth/login o crea una cuenta en /auth/registro."
}

pub async fn health(state: web::Data<AppState>) -> impl Responder {
    match state.client.health().await {
        Ok(envelope) => {
            let status = envelope.field("status").cloned();
            HttpResponse::Ok().json(json!({ "api": "ok", "status": status }))
        },
        Err(e) => {
            log::warn!("Clinic API health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({ "api": "down", "error": e.message() }))
        }
    }
}

pub async fn notifications(session: CurrentSession) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "notifications": session.notifications.take_visible(Utc::now())
    }))
}

pub async fn clear_cache(session: CurrentSession) -> impl Responder {
    let cleared = session.loader.cached_endpoints();
    session.loader.clear_cache(None);
    log::debug!("Cache cleared for session {}: {:?}", session.id, cleared);
    screen(&session, json!({ "cleared": cleared }))
}

pub async fn navigation(
    state: web::Data<AppState>,
    session: CurrentSession,
    page: web::Path<String>
) -> impl Responder {

    let page = match Page::from_path(&page) {
        Some(page) => page,
        None => {
            let error = ApiError::NotFound(format!("Página desconocida: {}", page));
            return load_failure(&state, &session, error).await;
        }
    };

    let usuario = session.usuario();
    let decision = protect_page(Some(&usuario), page);
    if let Navigation::Redirect { message: Some(message), .. } = &decision {
        session.notifications.error(message.clone());
    }

    screen(&session, json!({
        "page": page,
        "navigation": decision,
        "menu": mark_active(menu_for(usuario.rol), page),
    }))
}

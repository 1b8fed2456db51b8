use actix_web::{http::header, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::api::handlers::{failure, require, screen};
use crate::api::state::AppState;
use crate::domain::usuario::model::{PasswordChange, PerfilForm, Usuario};
use crate::infrastructure::http::backend_client::ApiEnvelope;
use crate::infrastructure::http::endpoints::USUARIOS;
use crate::services::navigation::{mark_active, Page};
use crate::services::permissions::{has_permission, menu_for, Section};
use crate::services::validation::{validate_password_change, validate_perfil};
use crate::utils::errors::ApiError;
use crate::utils::security::CurrentSession;

fn perfil_view(usuario: &Usuario) -> serde_json::Value {
    json!({
        "usuario": usuario,
        "rol_display": usuario.rol.display_name(),
        "menu": mark_active(menu_for(usuario.rol), Page::Perfil),
    })
}

/// The API answers the update with the stored user; when it does not, the
/// form is applied to the session copy.
fn updated_usuario(envelope: &ApiEnvelope, current: Usuario, form: PerfilForm) -> Usuario {
    match envelope.field("usuario").or_else(|| envelope.field("data")) {
        Some(value) if value.is_object() => match serde_json::from_value::<Usuario>(value.clone()) {
            Ok(usuario) => return usuario,
            Err(e) => log::warn!("Ignoring unreadable user in profile update: {}", e),
        },
        _ => {},
    }

    Usuario {
        nombre: form.nombre,
        telefono: Some(form.telefono).filter(|t| !t.trim().is_empty()),
        direccion: Some(form.direccion).filter(|d| !d.trim().is_empty()),
        ..current
    }
}

/// `perfil_<nombre>_<millis>.json`, kept to header-safe characters.
pub fn export_file_name(nombre: &str, millis: i64) -> String {
    let nombre: String = nombre
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("perfil_{}_{}.json", nombre, millis)
}

pub async fn get_perfil(
    state: web::Data<AppState>,
    session: CurrentSession
) -> impl Responder {

    match session.loader.client().auth().profile(&session.token).await {
        Ok(usuario) => {
            if let Err(e) = state.sessions.replace_user(&session.id.to_string(), usuario.clone()).await {
                return failure(&state, &session, "perfil", "load", e).await;
            }
            screen(&session, perfil_view(&usuario))
        },
        Err(e) => failure(&state, &session, "perfil", "load", e).await,
    }
}

pub async fn update_perfil(
    state: web::Data<AppState>,
    session: CurrentSession,
    form: web::Json<PerfilForm>
) -> impl Responder {

    let current = session.usuario();
    if let Err(e) = require(has_permission(current.rol, Section::Perfil)) {
        return failure(&state, &session, "perfil", "update", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_perfil(&form) {
        return failure(&state, &session, "perfil", "update", e).await;
    }

    let id = match current.record_id() {
        Some(id) => id.clone(),
        None => {
            let error = ApiError::InternalServerError("No se pudo obtener el ID del usuario".to_string());
            return failure(&state, &session, "perfil", "update", error).await;
        }
    };

    let result = session.loader.client().usuarios().update(&session.token, &id, &form).await;
    let envelope = match session.loader.record_write(USUARIOS, result, "Perfil actualizado correctamente", "Error al actualizar el perfil") {
        Ok(envelope) => envelope,
        Err(e) => return failure(&state, &session, "perfil", "update", e).await,
    };

    let usuario = updated_usuario(&envelope, current, form);
    if let Err(e) = state.sessions.replace_user(&session.id.to_string(), usuario.clone()).await {
        return failure(&state, &session, "perfil", "update", e).await;
    }

    screen(&session, perfil_view(&usuario))
}

pub async fn change_password(
    state: web::Data<AppState>,
    session: CurrentSession,
    change: web::Json<PasswordChange>
) -> impl Responder {

    let change = change.into_inner();
    if let Err(e) = validate_password_change(&change) {
        return failure(&state, &session, "perfil", "password", e).await;
    }

    let usuario = session.usuario();
    let id = match usuario.record_id() {
        Some(id) => id.clone(),
        None => {
            let error = ApiError::InternalServerError("No se pudo obtener el ID del usuario".to_string());
            return failure(&state, &session, "perfil", "password", error).await;
        }
    };

    let result = session
        .loader
        .client()
        .usuarios()
        .change_password(&session.token, &id, &change)
        .await
        .and_then(|envelope| envelope.into_success("Error al cambiar la contraseña"));

    match result {
        Ok(_) => {
            log::info!("Password changed for {}", usuario.email);
            session.notifications.success("Contraseña actualizada correctamente");
            screen(&session, json!({ "updated": true }))
        },
        Err(e) => failure(&state, &session, "perfil", "password", e).await,
    }
}

/// Downloads the session user as an indented JSON file.
pub async fn export_perfil(
    state: web::Data<AppState>,
    session: CurrentSession
) -> impl Responder {

    let usuario = session.usuario();
    let body = match serde_json::to_string_pretty(&usuario) {
        Ok(body) => body,
        Err(e) => return failure(&state, &session, "perfil", "load", e.into()).await,
    };

    let file_name = export_file_name(&usuario.nombre, Utc::now().timestamp_millis());
    HttpResponse::Ok()
        .content_type("application/json")
        .insert_header((header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)))
        .body(body)
}

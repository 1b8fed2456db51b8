use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde_json::json;

use crate::api::handlers::screen_with;
use crate::api::state::AppState;
use crate::domain::usuario::model::{LoginForm, RegistroForm};
use crate::services::navigation::{redirect_by_role, Page};
use crate::services::validation::{validate_login, validate_registro};
use crate::utils::errors::ApiError;
use crate::utils::security::CurrentSession;

async fn open_session(state: &AppState, credentials: &LoginForm, welcome: &str, created: bool) -> Result<HttpResponse, ApiError> {
    let login = state.client.auth().login(credentials).await?;
    let session = state.sessions.create(login.token, login.usuario).await?;
    session.notifications.success(welcome);

    let usuario = session.usuario();
    let redirect = redirect_by_role(Some(usuario.rol)).path();

    let mut builder = if created { HttpResponse::Created() } else { HttpResponse::Ok() };
    builder.cookie(state.session_cookie(session.id.to_string()));
    Ok(screen_with(builder, &session, json!({ "usuario": usuario, "redirect": redirect })))
}

pub async fn login(
    state: web::Data<AppState>,
    form: web::Json<LoginForm>
) -> impl Responder {

    let credentials = form.into_inner();
    if let Err(e) = validate_login(&credentials) {
        return e.error_response();
    }

    match open_session(&state, &credentials, "Login exitoso", false).await {
        Ok(response) => response,
        Err(e) => {
            log::info!("Login rejected for {}: {}", credentials.email, e);
            e.error_response()
        }
    }
}

/// Registers through the clinic API and signs the new user in.
pub async fn registro(
    state: web::Data<AppState>,
    form: web::Json<RegistroForm>
) -> impl Responder {

    let form = form.into_inner();
    if let Err(e) = validate_registro(&form) {
        return e.error_response();
    }

    if let Err(e) = state.client.auth().register(&form).await {
        log::info!("Registration rejected for {}: {}", form.email, e);
        return e.error_response();
    }

    let credentials = LoginForm { email: form.email, password: form.password };
    match open_session(&state, &credentials, "Registro exitoso", true).await {
        Ok(response) => response,
        Err(e) => e.error_response(),
    }
}

pub async fn logout(
    state: web::Data<AppState>,
    session: CurrentSession
) -> impl Responder {

    if let Err(e) = state.sessions.remove(&session.id.to_string()).await {
        return e.error_response();
    }
    session.notifications.success("Sesión cerrada correctamente");

    let mut builder = HttpResponse::Ok();
    builder.cookie(state.expired_session_cookie());
    screen_with(builder, &session, json!({ "redirect": Page::Login.path() }))
}

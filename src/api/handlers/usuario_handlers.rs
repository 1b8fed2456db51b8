use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::api::handlers::{failure, load_failure, require, screen, screen_with};
use crate::api::state::AppState;
use crate::domain::common::RecordId;
use crate::domain::usuario::model::{Rol, Usuario, UsuarioForm};
use crate::infrastructure::http::endpoints::{item_path, USUARIOS};
use crate::services::permissions::{can_delete_user, can_manage_users};
use crate::services::validation::validate_usuario;
use crate::utils::format::{format_date, or_na};
use crate::utils::security::CurrentSession;

#[derive(Deserialize, Debug, Default)]
pub struct UsuarioFilter {
    pub q: Option<String>,
    pub rol: Option<String>,
}

impl UsuarioFilter {

    /// The search matches nombre or email; `rol=todos` means no role filter.
    pub fn apply(&self, usuarios: Vec<Usuario>) -> Vec<Usuario> {
        let query = self.q.as_deref().unwrap_or("").trim().to_lowercase();
        let rol = self
            .rol
            .as_deref()
            .filter(|r| !r.trim().eq_ignore_ascii_case("todos"))
            .and_then(Rol::parse);

        usuarios
            .into_iter()
            .filter(|u| {
                query.is_empty()
                    || u.nombre.to_lowercase().contains(&query)
                    || u.email.to_lowercase().contains(&query)
            })
            .filter(|u| rol.map_or(true, |r| u.rol == r))
            .collect()
    }
}

#[derive(Serialize, Debug)]
pub struct UsuarioCard {
    pub id: Option<RecordId>,
    pub nombre: String,
    pub email: String,
    pub rol: Rol,
    pub rol_display: &'static str,
    pub telefono: String,
    pub direccion: String,
    pub fecha_registro: String,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl UsuarioCard {

    pub fn new(usuario: Usuario, actor: &Usuario) -> Self {
        let id = usuario.record_id().cloned();
        UsuarioCard {
            can_delete: id.as_ref().is_some_and(|id| can_delete_user(actor, id)),
            can_edit: can_manage_users(actor.rol),
            id,
            rol: usuario.rol,
            rol_display: usuario.rol.display_name(),
            telefono: or_na(usuario.telefono.as_deref()),
            direccion: or_na(usuario.direccion.as_deref()),
            fecha_registro: format_date(usuario.fecha_registro.as_deref()),
            nombre: usuario.nombre,
            email: usuario.email,
        }
    }
}

fn prefill(usuario: &Usuario) -> UsuarioForm {
    UsuarioForm {
        nombre: usuario.nombre.clone(),
        email: usuario.email.clone(),
        telefono: usuario.telefono.clone(),
        direccion: usuario.direccion.clone(),
        rol: Some(usuario.rol),
        password: None,
    }
}

pub async fn list_usuarios(
    state: web::Data<AppState>,
    session: CurrentSession,
    filter: web::Query<UsuarioFilter>
) -> impl Responder {

    let actor = session.usuario();
    if let Err(e) = require(can_manage_users(actor.rol)) {
        return failure(&state, &session, "usuarios", "load", e).await;
    }

    let usuarios = match session.loader.load_usuarios(&session.token).await {
        Ok(usuarios) => usuarios,
        Err(e) => return load_failure(&state, &session, e).await,
    };

    let cards: Vec<UsuarioCard> = filter
        .apply(usuarios)
        .into_iter()
        .map(|u| UsuarioCard::new(u, &actor))
        .collect();

    screen(&session, cards)
}

pub async fn get_usuario(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(can_manage_users(session.rol())) {
        return failure(&state, &session, "usuarios", "load", e).await;
    }

    let id = RecordId::new(id.into_inner());
    let result = session
        .loader
        .client()
        .usuarios()
        .get_by_id(&session.token, &id)
        .await
        .and_then(|envelope| envelope.into_success("Error al cargar el usuario"))
        .and_then(|envelope| envelope.item::<Usuario>("usuario"));

    match result {
        Ok(usuario) => screen(&session, prefill(&usuario)),
        Err(e) => failure(&state, &session, "usuarios", "load", e).await,
    }
}

/// New users go through the registration endpoint with the staff token.
pub async fn create_usuario(
    state: web::Data<AppState>,
    session: CurrentSession,
    form: web::Json<UsuarioForm>
) -> impl Responder {

    if let Err(e) = require(can_manage_users(session.rol())) {
        return failure(&state, &session, "usuarios", "create", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_usuario(&form, true) {
        return failure(&state, &session, "usuarios", "create", e).await;
    }

    let result = session.loader.client().usuarios().create(&session.token, &form).await;
    match session.loader.record_write(USUARIOS, result, "Usuario creado exitosamente", "Error al crear el usuario") {
        Ok(envelope) => screen_with(HttpResponse::Created(), &session, envelope.into_body()),
        Err(e) => failure(&state, &session, "usuarios", "create", e).await,
    }
}

pub async fn update_usuario(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>,
    form: web::Json<UsuarioForm>
) -> impl Responder {

    if let Err(e) = require(can_manage_users(session.rol())) {
        return failure(&state, &session, "usuarios", "update", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_usuario(&form, false) {
        return failure(&state, &session, "usuarios", "update", e).await;
    }

    let endpoint = item_path(USUARIOS, &RecordId::new(id.into_inner()));
    match session.loader.update_data(&session.token, &endpoint, &form, "Usuario actualizado exitosamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "usuarios", "update", e).await,
    }
}

pub async fn delete_usuario(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    let id = RecordId::new(id.into_inner());
    if let Err(e) = require(can_delete_user(&session.usuario(), &id)) {
        return failure(&state, &session, "usuarios", "delete", e).await;
    }

    let endpoint = item_path(USUARIOS, &id);
    match session.loader.delete_data(&session.token, &endpoint, "Usuario eliminado exitosamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "usuarios", "delete", e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario(id: &str, nombre: &str, email: &str, rol: Rol) -> Usuario {
        Usuario {
            id: Some(RecordId::new(id)),
            nombre: nombre.to_string(),
            email: email.to_string(),
            rol,
            ..Default::default()
        }
    }

    fn equipo() -> Vec<Usuario> {
        vec![
            usuario("1", "Ana Pérez", "ana@patitas.com", Rol::Admin),
            usuario("2", "Luis Gómez", "luis@patitas.com", Rol::Veterinario),
            usuario("3", "Marta Ruiz", "marta@correo.com", Rol::Cliente),
        ]
    }

    #[test]
    fn test_filter_by_query_and_rol() {
        let filter = UsuarioFilter { q: Some("PATITAS".to_string()), rol: Some("todos".to_string()) };
        assert_eq!(filter.apply(equipo()).len(), 2);

        let filter = UsuarioFilter { q: None, rol: Some("veterinario".to_string()) };
        let found = filter.apply(equipo());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nombre, "Luis Gómez");
    }

    #[test]
    fn test_admin_cannot_delete_self() {
        let admin = usuario("1", "Ana Pérez", "ana@patitas.com", Rol::Admin);
        let cards: Vec<UsuarioCard> = equipo().into_iter().map(|u| UsuarioCard::new(u, &admin)).collect();

        assert!(!cards[0].can_delete);
        assert!(cards[1].can_delete);
        assert_eq!(cards[0].rol_display, "Administrador");
        assert_eq!(cards[2].telefono, "N/A");
        assert_eq!(cards[2].fecha_registro, "N/A");
    }

    #[test]
    fn test_recepcionista_edits_but_never_deletes() {
        let recepcion = usuario("9", "Sofía", "sofia@patitas.com", Rol::Recepcionista);
        let card = UsuarioCard::new(usuario("3", "Marta", "marta@correo.com", Rol::Cliente), &recepcion);

        assert!(card.can_edit);
        assert!(!card.can_delete);
    }

    #[test]
    fn test_prefill_leaves_password_empty() {
        let form = prefill(&usuario("2", "Luis", "luis@patitas.com", Rol::Veterinario));
        assert_eq!(form.rol, Some(Rol::Veterinario));
        assert!(form.password.is_none());
    }
}

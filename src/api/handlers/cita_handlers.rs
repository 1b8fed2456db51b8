use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::api::handlers::{failure, load_failure, require, screen, screen_with, today};
use crate::api::state::AppState;
use crate::domain::cita::model::{Cita, CitaForm, EstadoCita};
use crate::domain::common::RecordId;
use crate::domain::mascota::model::Mascota;
use crate::domain::usuario::model::Usuario;
use crate::infrastructure::http::endpoints::{item_path, CITAS};
use crate::services::permissions::{can_cancel_appointment, has_permission, Section};
use crate::services::validation::validate_cita;
use crate::utils::format::{format_date, or_na, to_date_input};
use crate::utils::security::CurrentSession;

#[derive(Deserialize, Debug, Default)]
pub struct CitaFilter {
    pub q: Option<String>,
    pub estado: Option<String>,
}

impl CitaFilter {

    /// `estado=todas` means no state filter.
    pub fn apply(&self, citas: Vec<Cita>) -> Vec<Cita> {
        let estado = self
            .estado
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("todas"))
            .map(|e| EstadoCita::from(e.to_string()));

        citas
            .into_iter()
            .filter(|c| c.matches(self.q.as_deref().unwrap_or("")))
            .filter(|c| estado.as_ref().map_or(true, |e| &c.estado == e))
            .collect()
    }
}

#[derive(Serialize, Debug)]
pub struct CitaCard {
    pub id: Option<RecordId>,
    pub titulo: String,
    pub mascota: String,
    pub fecha: String,
    pub hora: String,
    pub motivo: String,
    pub estado: EstadoCita,
    pub estado_label: String,
    pub estado_color: &'static str,
    pub can_cancel: bool,
}

impl CitaCard {

    pub fn new(cita: Cita, can_cancel: bool) -> Self {
        let id = cita.record_id().cloned();
        CitaCard {
            titulo: match &id {
                Some(id) => format!("Cita #{}", id),
                None => "Cita".to_string(),
            },
            id,
            mascota: or_na(cita.mascota_nombre()),
            fecha: format_date(Some(&cita.fecha)),
            estado_label: cita.estado.label().to_string(),
            estado_color: cita.estado.color(),
            can_cancel: can_cancel && cita.estado.is_pending(),
            hora: cita.hora,
            motivo: cita.motivo,
            estado: cita.estado,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Opcion {
    pub id: Option<RecordId>,
    pub label: String,
}

pub fn mascota_opcion(mascota: &Mascota) -> Opcion {
    Opcion {
        id: mascota.record_id().cloned(),
        label: format!("{} ({})", mascota.nombre, mascota.especie),
    }
}

fn veterinario_opcion(usuario: &Usuario) -> Opcion {
    Opcion {
        id: usuario.record_id().cloned(),
        label: usuario.nombre.clone(),
    }
}

fn prefill(cita: &Cita) -> CitaForm {
    CitaForm {
        mascota_id: cita
            .mascota_id
            .clone()
            .or_else(|| cita.mascota.as_ref().and_then(|m| m.record_id().cloned())),
        veterinario_id: cita.veterinario.as_ref().and_then(|v| v.record_id().cloned()),
        fecha: to_date_input(Some(&cita.fecha)),
        hora: cita.hora.clone(),
        motivo: cita.motivo.clone(),
        estado: Some(cita.estado.clone()),
    }
}

pub async fn list_citas(
    state: web::Data<AppState>,
    session: CurrentSession,
    filter: web::Query<CitaFilter>
) -> impl Responder {

    let rol = session.rol();
    if let Err(e) = require(has_permission(rol, Section::Citas)) {
        return failure(&state, &session, "citas", "load", e).await;
    }

    let citas = match session.loader.load_citas(&session.token).await {
        Ok(citas) => citas,
        Err(e) => return load_failure(&state, &session, e).await,
    };

    let cards: Vec<CitaCard> = filter
        .apply(citas)
        .into_iter()
        .map(|c| CitaCard::new(c, can_cancel_appointment(rol)))
        .collect();

    screen(&session, cards)
}

/// Select options for the appointment form. Veterinarians are only listed
/// for roles that can read users.
pub async fn cita_opciones(
    state: web::Data<AppState>,
    session: CurrentSession
) -> impl Responder {

    let rol = session.rol();
    if let Err(e) = require(has_permission(rol, Section::Citas)) {
        return failure(&state, &session, "citas", "load", e).await;
    }

    let mascotas = match session.loader.load_mascotas(&session.token).await {
        Ok(mascotas) => mascotas,
        Err(e) => return load_failure(&state, &session, e).await,
    };

    let veterinarios = if has_permission(rol, Section::Usuarios) {
        match session.loader.load_veterinarios(&session.token).await {
            Ok(veterinarios) => veterinarios,
            Err(e) => return load_failure(&state, &session, e).await,
        }
    } else {
        Vec::new()
    };

    screen(&session, serde_json::json!({
        "mascotas": mascotas.iter().map(mascota_opcion).collect::<Vec<_>>(),
        "veterinarios": veterinarios.iter().map(veterinario_opcion).collect::<Vec<_>>(),
        "estados": ["programada", "confirmada", "completada", "cancelada"],
    }))
}

pub async fn get_cita(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(has_permission(session.rol(), Section::Citas)) {
        return failure(&state, &session, "citas", "load", e).await;
    }

    let id = RecordId::new(id.into_inner());
    let result = session
        .loader
        .client()
        .citas()
        .get_by_id(&session.token, &id)
        .await
        .and_then(|envelope| envelope.into_success("Error al cargar la cita"))
        .and_then(|envelope| envelope.item::<Cita>("cita"));

    match result {
        Ok(cita) => screen(&session, prefill(&cita)),
        Err(e) => failure(&state, &session, "citas", "load", e).await,
    }
}

pub async fn create_cita(
    state: web::Data<AppState>,
    session: CurrentSession,
    form: web::Json<CitaForm>
) -> impl Responder {

    if let Err(e) = require(has_permission(session.rol(), Section::Citas)) {
        return failure(&state, &session, "citas", "create", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_cita(&form, today(), true) {
        return failure(&state, &session, "citas", "create", e).await;
    }

    match session.loader.create_data(&session.token, CITAS, &form, "Cita creada correctamente").await {
        Ok(envelope) => screen_with(HttpResponse::Created(), &session, envelope.into_body()),
        Err(e) => failure(&state, &session, "citas", "create", e).await,
    }
}

pub async fn update_cita(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>,
    form: web::Json<CitaForm>
) -> impl Responder {

    if let Err(e) = require(has_permission(session.rol(), Section::Citas)) {
        return failure(&state, &session, "citas", "update", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_cita(&form, today(), false) {
        return failure(&state, &session, "citas", "update", e).await;
    }

    let endpoint = item_path(CITAS, &RecordId::new(id.into_inner()));
    match session.loader.update_data(&session.token, &endpoint, &form, "Cita actualizada correctamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "citas", "update", e).await,
    }
}

pub async fn cancel_cita(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(can_cancel_appointment(session.rol())) {
        return failure(&state, &session, "citas", "cancel", e).await;
    }

    let id = RecordId::new(id.into_inner());
    let result = session.loader.client().citas().cancel(&session.token, &id).await;

    match session.loader.record_write(CITAS, result, "Cita cancelada correctamente", "Error al cancelar la cita") {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "citas", "cancel", e).await,
    }
}

pub async fn delete_cita(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(has_permission(session.rol(), Section::Citas)) {
        return failure(&state, &session, "citas", "delete", e).await;
    }

    let endpoint = item_path(CITAS, &RecordId::new(id.into_inner()));
    match session.loader.delete_data(&session.token, &endpoint, "Cita eliminada correctamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "citas", "delete", e).await,
    }
}

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::api::handlers::cita_handlers::mascota_opcion;
use crate::api::handlers::{failure, load_failure, require, screen, screen_with};
use crate::api::state::AppState;
use crate::domain::common::RecordId;
use crate::domain::historial::model::{Historial, HistorialForm};
use crate::infrastructure::http::endpoints::{item_path, HISTORIALES};
use crate::services::permissions::{can_create_history, can_delete_history, can_edit_history, has_permission, Section};
use crate::services::validation::validate_historial;
use crate::utils::format::{or_na, to_date_input};
use crate::utils::security::CurrentSession;

#[derive(Serialize, Debug)]
pub struct HistorialCard {
    pub id: Option<RecordId>,
    pub titulo: String,
    pub mascota: String,
    pub vacunas: usize,
    pub alergias: usize,
    pub cirugias: usize,
    pub enfermedades_cronicas: usize,
    pub medicamentos_actuales: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl HistorialCard {

    pub fn new(historial: Historial, can_edit: bool, can_delete: bool) -> Self {
        let id = historial.record_id().cloned();
        HistorialCard {
            titulo: match &id {
                Some(id) => format!("Historial #{}", id),
                None => "Historial".to_string(),
            },
            id,
            mascota: or_na(historial.mascota_nombre()),
            vacunas: historial.vacunas.len(),
            alergias: historial.alergias.len(),
            cirugias: historial.cirugias.len(),
            enfermedades_cronicas: historial.enfermedades_cronicas.len(),
            medicamentos_actuales: historial.medicamentos_actuales.len(),
            notas: historial.notas_generales,
            can_edit,
            can_delete,
        }
    }
}

fn prefill(historial: &Historial) -> HistorialForm {
    let date_input = |fecha: &Option<String>| Some(to_date_input(fecha.as_deref())).filter(|f| !f.is_empty());

    let mut form = HistorialForm::from_historial(historial);
    for vacuna in &mut form.vacunas {
        vacuna.fecha = date_input(&vacuna.fecha);
        vacuna.proxima_fecha = date_input(&vacuna.proxima_fecha);
    }
    for cirugia in &mut form.cirugias {
        cirugia.fecha = date_input(&cirugia.fecha);
    }
    form
}

pub async fn list_historiales(
    state: web::Data<AppState>,
    session: CurrentSession
) -> impl Responder {

    let rol = session.rol();
    if let Err(e) = require(has_permission(rol, Section::Historiales)) {
        return failure(&state, &session, "historiales", "load", e).await;
    }

    let historiales = match session.loader.load_historiales(&session.token).await {
        Ok(historiales) => historiales,
        Err(e) => return load_failure(&state, &session, e).await,
    };

    let cards: Vec<HistorialCard> = historiales
        .into_iter()
        .map(|h| HistorialCard::new(h, can_edit_history(rol), can_delete_history(rol)))
        .collect();

    screen(&session, cards)
}

pub async fn historial_opciones(
    state: web::Data<AppState>,
    session: CurrentSession
) -> impl Responder {

    if let Err(e) = require(can_create_history(session.rol())) {
        return failure(&state, &session, "historiales", "load", e).await;
    }

    match session.loader.load_mascotas(&session.token).await {
        Ok(mascotas) => screen(&session, serde_json::json!({
            "mascotas": mascotas.iter().map(mascota_opcion).collect::<Vec<_>>(),
            "gravedades": ["Leve", "Moderada", "Severa"],
        })),
        Err(e) => load_failure(&state, &session, e).await,
    }
}

pub async fn get_historial(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(can_edit_history(session.rol())) {
        return failure(&state, &session, "historiales", "load", e).await;
    }

    let id = RecordId::new(id.into_inner());
    let result = session
        .loader
        .client()
        .historiales()
        .get_by_id(&session.token, &id)
        .await
        .and_then(|envelope| envelope.into_success("Error al cargar el historial"))
        .and_then(|envelope| envelope.item::<Historial>("historial"));

    match result {
        Ok(historial) => screen(&session, prefill(&historial)),
        Err(e) => failure(&state, &session, "historiales", "load", e).await,
    }
}

pub async fn create_historial(
    state: web::Data<AppState>,
    session: CurrentSession,
    form: web::Json<HistorialForm>
) -> impl Responder {

    if let Err(e) = require(can_create_history(session.rol())) {
        return failure(&state, &session, "historiales", "create", e).await;
    }

    let form = form.into_inner().normalized();
    if let Err(e) = validate_historial(&form) {
        return failure(&state, &session, "historiales", "create", e).await;
    }

    match session.loader.create_data(&session.token, HISTORIALES, &form, "Historial creado exitosamente").await {
        Ok(envelope) => screen_with(HttpResponse::Created(), &session, envelope.into_body()),
        Err(e) => failure(&state, &session, "historiales", "create", e).await,
    }
}

pub async fn update_historial(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>,
    form: web::Json<HistorialForm>
) -> impl Responder {

    if let Err(e) = require(can_edit_history(session.rol())) {
        return failure(&state, &session, "historiales", "update", e).await;
    }

    let form = form.into_inner().normalized();
    if let Err(e) = validate_historial(&form) {
        return failure(&state, &session, "historiales", "update", e).await;
    }

    let endpoint = item_path(HISTORIALES, &RecordId::new(id.into_inner()));
    match session.loader.update_data(&session.token, &endpoint, &form, "Historial actualizado exitosamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "historiales", "update", e).await,
    }
}

pub async fn delete_historial(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(can_delete_history(session.rol())) {
        return failure(&state, &session, "historiales", "delete", e).await;
    }

    let endpoint = item_path(HISTORIALES, &RecordId::new(id.into_inner()));
    match session.loader.delete_data(&session.token, &endpoint, "Historial eliminado exitosamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "historiales", "delete", e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn historial() -> Historial {
        serde_json::from_value(json!({
            "_id": "h12",
            "mascota": { "_id": "m3", "nombre": "Rocky" },
            "vacunas": [
                { "nombre": "Rabia", "fecha": "2024-01-10T00:00:00.000Z", "proxima_fecha": "2025-01-10T00:00:00.000Z" }
            ],
            "alergias": [{ "sustancia": "Penicilina", "gravedad": "Severa" }],
            "cirugias": null,
            "enfermedades_cronicas": ["Artritis"],
            "medicamentos_actuales": []
        })).unwrap()
    }

    #[test]
    fn test_card_counts_and_flags() {
        let card = HistorialCard::new(historial(), true, false);

        assert_eq!(card.titulo, "Historial #h12");
        assert_eq!(card.mascota, "Rocky");
        assert_eq!((card.vacunas, card.alergias, card.cirugias), (1, 1, 0));
        assert_eq!(card.enfermedades_cronicas, 1);
        assert!(card.can_edit);
        assert!(!card.can_delete);

        let body = serde_json::to_value(&card).unwrap();
        assert!(body.get("notas").is_none());
    }

    #[test]
    fn test_prefill_formats_dates_for_inputs() {
        let form = prefill(&historial());

        assert_eq!(form.id_mascota, Some(RecordId::new("m3")));
        assert_eq!(form.vacunas[0].fecha.as_deref(), Some("2024-01-10"));
        assert_eq!(form.vacunas[0].proxima_fecha.as_deref(), Some("2025-01-10"));
    }
}

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::api::handlers::{failure, load_failure, require, screen, screen_with, today};
use crate::api::state::AppState;
use crate::domain::common::RecordId;
use crate::domain::mascota::model::{Mascota, MascotaForm};
use crate::infrastructure::http::endpoints::{item_path, MASCOTAS};
use crate::services::permissions::{can_delete_pet, can_edit_pet, has_permission, Section};
use crate::services::validation::validate_mascota;
use crate::utils::format::{format_date_long, or_na, to_date_input, yes_no};
use crate::utils::security::CurrentSession;

#[derive(Deserialize, Debug, Default)]
pub struct MascotaFilter {
    pub q: Option<String>,
    pub especie: Option<String>,
}

impl MascotaFilter {

    /// `especie=todos` means no species filter.
    pub fn apply(&self, mascotas: Vec<Mascota>) -> Vec<Mascota> {
        let especie = self
            .especie
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("todos"));

        mascotas
            .into_iter()
            .filter(|m| m.matches(self.q.as_deref().unwrap_or("")))
            .filter(|m| especie.map_or(true, |e| m.especie.eq_ignore_ascii_case(e)))
            .collect()
    }
}

#[derive(Serialize, Debug)]
pub struct MascotaCard {
    pub id: Option<RecordId>,
    pub nombre: String,
    pub especie: String,
    pub raza: String,
    pub sexo: String,
    pub color: String,
    pub esterilizado: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foto: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl MascotaCard {

    pub fn new(mascota: Mascota, can_edit: bool, can_delete: bool) -> Self {
        MascotaCard {
            id: mascota.record_id().cloned(),
            raza: or_na(mascota.raza.as_deref()),
            sexo: or_na(mascota.sexo.as_deref()),
            color: or_na(mascota.color.as_deref()),
            esterilizado: yes_no(mascota.esterilizado),
            fecha_nacimiento: mascota
                .fecha_nacimiento
                .as_deref()
                .map(|fecha| format_date_long(Some(fecha))),
            foto: mascota.foto,
            nombre: mascota.nombre,
            especie: mascota.especie,
            can_edit,
            can_delete,
        }
    }
}

fn prefill(mascota: &Mascota) -> MascotaForm {
    MascotaForm {
        nombre: mascota.nombre.clone(),
        especie: mascota.especie.clone(),
        raza: mascota.raza.clone(),
        sexo: mascota.sexo.clone(),
        color: mascota.color.clone(),
        esterilizado: mascota.esterilizado,
        fecha_nacimiento: Some(to_date_input(mascota.fecha_nacimiento.as_deref())).filter(|f| !f.is_empty()),
        foto: mascota.foto.clone(),
    }
}

pub async fn list_mascotas(
    state: web::Data<AppState>,
    session: CurrentSession,
    filter: web::Query<MascotaFilter>
) -> impl Responder {

    let rol = session.rol();
    if let Err(e) = require(has_permission(rol, Section::Mascotas)) {
        return failure(&state, &session, "mascotas", "load", e).await;
    }

    let mascotas = match session.loader.load_mascotas(&session.token).await {
        Ok(mascotas) => mascotas,
        Err(e) => return load_failure(&state, &session, e).await,
    };

    let cards: Vec<MascotaCard> = filter
        .apply(mascotas)
        .into_iter()
        .map(|m| MascotaCard::new(m, can_edit_pet(rol), can_delete_pet(rol)))
        .collect();

    screen(&session, cards)
}

pub async fn get_mascota(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(can_edit_pet(session.rol())) {
        return failure(&state, &session, "mascotas", "load", e).await;
    }

    let id = RecordId::new(id.into_inner());
    let result = session
        .loader
        .client()
        .mascotas()
        .get_by_id(&session.token, &id)
        .await
        .and_then(|envelope| envelope.into_success("Error al cargar la mascota"))
        .and_then(|envelope| envelope.item::<Mascota>("mascota"));

    match result {
        Ok(mascota) => screen(&session, prefill(&mascota)),
        Err(e) => failure(&state, &session, "mascotas", "load", e).await,
    }
}

pub async fn create_mascota(
    state: web::Data<AppState>,
    session: CurrentSession,
    form: web::Json<MascotaForm>
) -> impl Responder {

    if let Err(e) = require(can_edit_pet(session.rol())) {
        return failure(&state, &session, "mascotas", "create", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_mascota(&form, today()) {
        return failure(&state, &session, "mascotas", "create", e).await;
    }

    match session.loader.create_data(&session.token, MASCOTAS, &form, "Mascota creada exitosamente").await {
        Ok(envelope) => screen_with(HttpResponse::Created(), &session, envelope.into_body()),
        Err(e) => failure(&state, &session, "mascotas", "create", e).await,
    }
}

pub async fn update_mascota(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>,
    form: web::Json<MascotaForm>
) -> impl Responder {

    if let Err(e) = require(can_edit_pet(session.rol())) {
        return failure(&state, &session, "mascotas", "update", e).await;
    }

    let form = form.into_inner();
    if let Err(e) = validate_mascota(&form, today()) {
        return failure(&state, &session, "mascotas", "update", e).await;
    }

    let endpoint = item_path(MASCOTAS, &RecordId::new(id.into_inner()));
    match session.loader.update_data(&session.token, &endpoint, &form, "Mascota actualizada exitosamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "mascotas", "update", e).await,
    }
}

pub async fn delete_mascota(
    state: web::Data<AppState>,
    session: CurrentSession,
    id: web::Path<String>
) -> impl Responder {

    if let Err(e) = require(can_delete_pet(session.rol())) {
        return failure(&state, &session, "mascotas", "delete", e).await;
    }

    let endpoint = item_path(MASCOTAS, &RecordId::new(id.into_inner()));
    match session.loader.delete_data(&session.token, &endpoint, "Mascota eliminada exitosamente").await {
        Ok(envelope) => screen(&session, envelope.into_body()),
        Err(e) => failure(&state, &session, "mascotas", "delete", e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mascota(nombre: &str, especie: &str) -> Mascota {
        Mascota { nombre: nombre.to_string(), especie: especie.to_string(), ..Default::default() }
    }

    fn nombres(mascotas: &[Mascota]) -> Vec<&str> {
        mascotas.iter().map(|m| m.nombre.as_str()).collect()
    }

    #[test]
    fn test_filter_by_query_and_especie() {
        let mascotas = vec![mascota("Toby", "Perro"), mascota("Michi", "Gato"), mascota("Tomasa", "Gato")];

        let filter = MascotaFilter { q: Some("to".to_string()), especie: Some("todos".to_string()) };
        assert_eq!(nombres(&filter.apply(mascotas.clone())), vec!["Toby", "Tomasa"]);

        let filter = MascotaFilter { q: None, especie: Some("gato".to_string()) };
        assert_eq!(nombres(&filter.apply(mascotas.clone())), vec!["Michi", "Tomasa"]);

        let filter = MascotaFilter::default();
        assert_eq!(filter.apply(mascotas).len(), 3);
    }

    #[test]
    fn test_card_fills_missing_fields() {
        let mut luna = mascota("Luna", "Gato");
        luna.id = Some(RecordId::new("8"));
        luna.esterilizado = true;
        luna.fecha_nacimiento = Some("2021-03-15T00:00:00.000Z".to_string());

        let card = MascotaCard::new(luna, true, false);
        assert_eq!(card.raza, "N/A");
        assert_eq!(card.esterilizado, "Sí");
        assert_eq!(card.fecha_nacimiento.as_deref(), Some("15 de marzo de 2021"));

        let body = serde_json::to_value(&card).unwrap();
        assert_eq!(body["id"], 8);
        assert!(body.get("foto").is_none());
        assert_eq!(body["can_delete"], false);
    }

    #[test]
    fn test_prefill_uses_date_input_format() {
        let mut toby = mascota("Toby", "Perro");
        toby.fecha_nacimiento = Some("2019-11-02T00:00:00.000Z".to_string());

        let form = prefill(&toby);
        assert_eq!(form.fecha_nacimiento.as_deref(), Some("2019-11-02"));
        assert!(prefill(&mascota("Kiwi", "Ave")).fecha_nacimiento.is_none());
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::common::{blank_as_none, null_as_default, pick_id, NamedRef, RecordId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum EstadoCita {
    #[default]
    Programada,
    Confirmada,
    Completada,
    Cancelada,
    Otro(String),
}

impl EstadoCita {

    pub fn as_str(&self) -> &str {
        match self {
            EstadoCita::Programada => "programada",
            EstadoCita::Confirmada => "confirmada",
            EstadoCita::Completada => "completada",
            EstadoCita::Cancelada => "cancelada",
            EstadoCita::Otro(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EstadoCita::Programada => "Programada",
            EstadoCita::Confirmada => "Confirmada",
            EstadoCita::Completada => "Completada",
            EstadoCita::Cancelada => "Cancelada",
            EstadoCita::Otro(raw) => raw,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            EstadoCita::Programada => "#ffc107",
            EstadoCita::Confirmada => "#17a2b8",
            EstadoCita::Completada => "#28a745",
            EstadoCita::Cancelada => "#dc3545",
            EstadoCita::Otro(_) => "#6c757d",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, EstadoCita::Programada | EstadoCita::Confirmada)
    }
}

impl From<String> for EstadoCita {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "programada" => EstadoCita::Programada,
            "confirmada" => EstadoCita::Confirmada,
            "completada" => EstadoCita::Completada,
            "cancelada" => EstadoCita::Cancelada,
            _ => EstadoCita::Otro(value),
        }
    }
}

impl From<EstadoCita> for String {
    fn from(estado: EstadoCita) -> Self {
        estado.as_str().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Cita {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mascota: Option<NamedRef>,
    #[serde(rename = "mascotaId", default, skip_serializing_if = "Option::is_none")]
    pub mascota_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinario: Option<NamedRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fecha: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hora: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub motivo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub estado: EstadoCita,
}

impl Cita {

    pub fn record_id(&self) -> Option<&RecordId> {
        pick_id(&self.id, &self.object_id)
    }

    pub fn mascota_nombre(&self) -> Option<&str> {
        self.mascota.as_ref().and_then(|m| m.nombre.as_deref())
    }

    /// Case-insensitive match on the mascota name or the motivo.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.mascota_nombre().is_some_and(|n| n.to_lowercase().contains(&query))
            || self.motivo.to_lowercase().contains(&query)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CitaForm {
    #[serde(rename = "mascotaId", default, deserialize_with = "blank_as_none")]
    pub mascota_id: Option<RecordId>,
    #[serde(rename = "veterinarioId", default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub veterinario_id: Option<RecordId>,
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub hora: String,
    #[serde(default)]
    pub motivo: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub estado: Option<EstadoCita>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estado_labels_and_colors() {
        assert_eq!(EstadoCita::Programada.label(), "Programada");
        assert_eq!(EstadoCita::Cancelada.color(), "#dc3545");
        assert_eq!(EstadoCita::from("COMPLETADA".to_string()), EstadoCita::Completada);

        let otro = EstadoCita::from("reprogramada".to_string());
        assert_eq!(otro.label(), "reprogramada");
        assert_eq!(otro.color(), "#6c757d");
    }

    #[test]
    fn test_estado_round_trips_unknown_values() {
        let estado: EstadoCita = serde_json::from_value(json!("en espera")).unwrap();
        assert_eq!(serde_json::to_value(&estado).unwrap(), json!("en espera"));
    }

    #[test]
    fn test_pending_states() {
        assert!(EstadoCita::Programada.is_pending());
        assert!(EstadoCita::Confirmada.is_pending());
        assert!(!EstadoCita::Completada.is_pending());
        assert!(!EstadoCita::Cancelada.is_pending());
    }

    #[test]
    fn test_cita_from_api() {
        let cita: Cita = serde_json::from_value(json!({
            "id": 9,
            "mascota": { "nombre": "Firulais" },
            "mascotaId": 3,
            "fecha": "2024-03-15",
            "hora": "10:30",
            "motivo": "Vacunación",
            "estado": "programada"
        })).unwrap();

        assert_eq!(cita.record_id().unwrap().as_str(), "9");
        assert_eq!(cita.mascota_nombre(), Some("Firulais"));
        assert!(cita.matches("firu"));
        assert!(cita.matches("vacuna"));
        assert!(!cita.matches("cirugía"));
    }

    #[test]
    fn test_form_sends_numeric_mascota_id() {
        let form: CitaForm = serde_json::from_value(json!({
            "mascotaId": "3",
            "fecha": "2030-01-10",
            "hora": "09:00",
            "motivo": "Control",
            "estado": ""
        })).unwrap();

        let body = serde_json::to_value(&form).unwrap();
        assert_eq!(body["mascotaId"], json!(3));
        assert!(body.get("estado").is_none());
    }
}

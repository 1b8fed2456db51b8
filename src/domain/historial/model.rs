use serde::{Deserialize, Serialize};

use crate::domain::common::{blank_as_none, null_as_default, pick_id, NamedRef, RecordId};

/// Allergy severity. The API stores free text, so unknown values are kept as-is.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Gravedad {
    Leve,
    Moderada,
    Severa,
    Otro(String),
}

impl Gravedad {

    pub fn as_str(&self) -> &str {
        match self {
            Gravedad::Leve => "Leve",
            Gravedad::Moderada => "Moderada",
            Gravedad::Severa => "Severa",
            Gravedad::Otro(raw) => raw,
        }
    }
}

impl From<String> for Gravedad {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "leve" => Gravedad::Leve,
            "moderada" => Gravedad::Moderada,
            "severa" => Gravedad::Severa,
            _ => Gravedad::Otro(value),
        }
    }
}

impl From<Gravedad> for String {
    fn from(gravedad: Gravedad) -> Self {
        gravedad.as_str().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Vacuna {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nombre: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub proxima_fecha: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub lote: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub veterinario: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Alergia {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sustancia: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub gravedad: Option<Gravedad>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub reaccion: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Cirugia {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nombre: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub veterinario: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub complicaciones: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Medicamento {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nombre: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub dosis: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub frecuencia: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Historial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_mascota: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mascota: Option<NamedRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vacunas: Vec<Vacuna>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alergias: Vec<Alergia>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cirugias: Vec<Cirugia>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enfermedades_cronicas: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medicamentos_actuales: Vec<Medicamento>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub notas_generales: Option<String>,
}

impl Historial {

    pub fn record_id(&self) -> Option<&RecordId> {
        pick_id(&self.id, &self.object_id)
    }

    pub fn mascota_nombre(&self) -> Option<&str> {
        self.mascota.as_ref().and_then(|m| m.nombre.as_deref())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HistorialForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id_mascota: Option<RecordId>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub notas_generales: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vacunas: Vec<Vacuna>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alergias: Vec<Alergia>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cirugias: Vec<Cirugia>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enfermedades_cronicas: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medicamentos_actuales: Vec<Medicamento>,
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

impl HistorialForm {

    /// Drops incomplete rows: vaccines need nombre, fecha and proxima_fecha;
    /// the other lists need their key field. Chronic diseases are trimmed.
    pub fn normalized(mut self) -> Self {
        self.vacunas.retain(|v| filled(&v.nombre) && v.fecha.is_some() && v.proxima_fecha.is_some());
        self.alergias.retain(|a| filled(&a.sustancia));
        self.cirugias.retain(|c| filled(&c.nombre));
        self.medicamentos_actuales.retain(|m| filled(&m.nombre));
        self.enfermedades_cronicas = self
            .enfermedades_cronicas
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn from_historial(historial: &Historial) -> Self {
        HistorialForm {
            id_mascota: historial
                .id_mascota
                .clone()
                .or_else(|| historial.mascota.as_ref().and_then(|m| m.record_id().cloned())),
            notas_generales: historial.notas_generales.clone(),
            vacunas: historial.vacunas.clone(),
            alergias: historial.alergias.clone(),
            cirugias: historial.cirugias.clone(),
            enfermedades_cronicas: historial.enfermedades_cronicas.clone(),
            medicamentos_actuales: historial.medicamentos_actuales.clone(),
        }
    }
}

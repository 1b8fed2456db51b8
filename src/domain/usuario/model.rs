use serde::{Deserialize, Serialize};

use crate::domain::common::{blank_as_none, null_as_default, pick_id, RecordId};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Veterinario,
    Recepcionista,
    #[default]
    #[serde(other)]
    Cliente,
}

impl Rol {

    pub const ALL: [Rol; 4] = [Rol::Admin, Rol::Veterinario, Rol::Recepcionista, Rol::Cliente];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Veterinario => "veterinario",
            Rol::Recepcionista => "recepcionista",
            Rol::Cliente => "cliente",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Rol::Admin => "Administrador",
            Rol::Veterinario => "Veterinario",
            Rol::Recepcionista => "Recepcionista",
            Rol::Cliente => "Cliente",
        }
    }

    pub fn parse(value: &str) -> Option<Rol> {
        Rol::ALL
            .into_iter()
            .find(|rol| rol.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Usuario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nombre: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rol: Rol,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub fecha_registro: Option<String>,
}

impl Usuario {

    pub fn record_id(&self) -> Option<&RecordId> {
        pick_id(&self.id, &self.object_id)
    }

    pub fn is(&self, other: &RecordId) -> bool {
        self.id.as_ref() == Some(other) || self.object_id.as_ref() == Some(other)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegistroForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rol: Rol,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UsuarioForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub rol: Option<Rol>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PerfilForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub direccion: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

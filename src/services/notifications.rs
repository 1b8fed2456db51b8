use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::infrastructure::http::backend_client::SESSION_EXPIRED;
use crate::utils::errors::ApiError;

pub const MAX_VISIBLE: usize = 5;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {

    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Success => "✅",
            NotificationKind::Error => "❌",
            NotificationKind::Warning => "⚠️",
            NotificationKind::Info => "ℹ️",
        }
    }

    pub fn default_duration_ms(&self) -> u64 {
        match self {
            NotificationKind::Success => 5000,
            NotificationKind::Error => 7000,
            NotificationKind::Warning => 6000,
            NotificationKind::Info => 5000,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub icon: &'static str,
    pub message: String,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Notification {

    /// A zero duration never expires.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.duration_ms == 0
            || now < self.created_at + Duration::milliseconds(self.duration_ms as i64)
    }
}

/// Per-session queue of toasts, drained into every private response.
#[derive(Default)]
pub struct NotificationSystem {
    queue: Mutex<Vec<Notification>>,
}

impl NotificationSystem {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, message: impl Into<String>, kind: NotificationKind, duration_ms: u64) -> Uuid {
        let message = message.into();
        let now = Utc::now();
        let mut queue = self.queue.lock();

        if let Some(existing) = queue
            .iter_mut()
            .find(|n| n.kind == kind && n.message == message && n.is_visible(now))
        {
            existing.created_at = now;
            existing.duration_ms = duration_ms;
            return existing.id;
        }

        let id = Uuid::new_v4();
        queue.push(Notification {
            id,
            kind,
            icon: kind.icon(),
            message,
            duration_ms,
            created_at: now,
        });

        while queue.len() > MAX_VISIBLE {
            queue.remove(0);
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.show(message, NotificationKind::Success, NotificationKind::Success.default_duration_ms())
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.show(message, NotificationKind::Error, NotificationKind::Error.default_duration_ms())
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.show(message, NotificationKind::Warning, NotificationKind::Warning.default_duration_ms())
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.show(message, NotificationKind::Info, NotificationKind::Info.default_duration_ms())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.queue
            .lock()
            .iter()
            .filter(|n| n.is_visible(now))
            .cloned()
            .collect()
    }

    /// Drains the queue, returning what is still visible.
    pub fn take_visible(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let drained: Vec<Notification> = self.queue.lock().drain(..).collect();
        drained.into_iter().filter(|n| n.is_visible(now)).collect()
    }

    pub fn show_context_error(&self, context: &str, action: &str) -> Uuid {
        self.error(context_error_message(context, action))
    }
}

pub fn context_error_message(context: &str, action: &str) -> String {
    let message = match (context, action) {
        ("mascotas", "load") => "Error al cargar las mascotas",
        ("mascotas", "create") => "Error al registrar la mascota",
        ("mascotas", "update") => "Error al actualizar la mascota",
        ("mascotas", "delete") => "Error al eliminar la mascota",
        ("mascotas", "not_found") => "La mascota no fue encontrada.",
        ("mascotas", "no_permission") => "No tienes permisos para gestionar mascotas",

        ("citas", "load") => "Error al cargar las citas",
        ("citas", "create") => "Error al guardar la cita",
        ("citas", "update") => "Error al actualizar la cita",
        ("citas", "delete") => "Error al eliminar la cita",
        ("citas", "cancel") => "Error al cancelar la cita",
        ("citas", "not_found") => "La cita no fue encontrada.",
        ("citas", "no_permission") => "No tienes permisos para gestionar citas",

        ("historiales", "load") => "Error al cargar los historiales médicos",
        ("historiales", "create") => "Error al crear el historial",
        ("historiales", "update") => "Error al actualizar el historial",
        ("historiales", "delete") => "Error al eliminar el historial",
        ("historiales", "not_found") => "El historial no fue encontrado.",
        ("historiales", "no_permission") => "No tienes permisos para gestionar historiales médicos",

        ("usuarios", "load") => "Error al cargar los usuarios",
        ("usuarios", "create") => "Error al crear el usuario",
        ("usuarios", "update") => "Error al actualizar el usuario",
        ("usuarios", "delete") => "Error al eliminar el usuario",
        ("usuarios", "not_found") => "El usuario no fue encontrado.",
        ("usuarios", "no_permission") => "No tienes permisos para gestionar usuarios",

        ("perfil", "load") => "Error al cargar el perfil",
        ("perfil", "update") => "Error al actualizar el perfil",
        ("perfil", "password") => "Error al cambiar la contraseña",
        ("perfil", "not_found") => "El usuario no fue encontrado.",

        (_, "no_permission") => "No tienes permisos para realizar esta acción",
        (_, "not_found") => "El recurso solicitado no fue encontrado.",
        _ => "Ha ocurrido un error. Inténtalo de nuevo.",
    };
    message.to_string()
}

pub const INVALID_DATA: &str = "Datos inválidos. Verifica la información ingresada.";
pub const CONNECTION_LOST: &str = "Error de conexión. Verifica tu conexión a internet.";

/// Toast text for a failed screen action, or `None` when the failure carries
/// its own details or was already reported.
pub fn api_error_notice(context: &str, action: &str, error: &ApiError) -> Option<String> {
    let notice = match error {
        ApiError::Validation(_) | ApiError::AlreadyLoading(_) => return None,
        ApiError::Unauthorized(_) => SESSION_EXPIRED.to_string(),
        ApiError::Network(_) => CONNECTION_LOST.to_string(),
        ApiError::BadRequest(_) if context == "perfil" && action == "password" => {
            "La contraseña actual es incorrecta.".to_string()
        },
        ApiError::Unprocessable(_) if context == "perfil" && action == "password" => {
            "La nueva contraseña no cumple con los requisitos.".to_string()
        },
        ApiError::BadRequest(_) => INVALID_DATA.to_string(),
        ApiError::Conflict(message) => match context {
            "mascotas" => "Ya existe una mascota con estos datos.".to_string(),
            "usuarios" => "Ya existe un usuario con ese email.".to_string(),
            _ => message.clone(),
        },
        ApiError::NotFound(_) => context_error_message(context, "not_found"),
        ApiError::Forbidden(_) => context_error_message(context, "no_permission"),
        ApiError::Upstream { message, .. } if !message.is_empty() => message.clone(),
        _ => context_error_message(context, action),
    };
    Some(notice)
}

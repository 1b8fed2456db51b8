use serde::Serialize;

use crate::domain::common::RecordId;
use crate::domain::usuario::model::{Rol, Usuario};
use crate::services::navigation::Page;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Usuarios,
    Mascotas,
    Citas,
    Historiales,
    Perfil,
}

pub fn has_permission(rol: Rol, section: Section) -> bool {
    use Section::*;

    match rol {
        Rol::Admin => true,
        Rol::Veterinario => matches!(section, Mascotas | Historiales | Citas | Perfil),
        Rol::Recepcionista => matches!(section, Usuarios | Citas | Perfil),
        Rol::Cliente => matches!(section, Mascotas | Citas | Historiales | Perfil),
    }
}

/// An empty `allowed` list lets any signed-in role through.
pub fn check_access(rol: Option<Rol>, allowed: &[Rol]) -> bool {
    match rol {
        Some(rol) => allowed.is_empty() || allowed.contains(&rol),
        None => false,
    }
}

pub fn can_create_history(rol: Rol) -> bool {
    matches!(rol, Rol::Veterinario | Rol::Admin)
}

pub fn can_edit_history(rol: Rol) -> bool {
    matches!(rol, Rol::Veterinario | Rol::Admin)
}

pub fn can_delete_history(rol: Rol) -> bool {
    rol == Rol::Admin
}

pub fn can_manage_users(rol: Rol) -> bool {
    matches!(rol, Rol::Admin | Rol::Recepcionista)
}

/// Admins delete users, but never themselves.
pub fn can_delete_user(actor: &Usuario, target: &RecordId) -> bool {
    actor.rol == Rol::Admin && !actor.is(target)
}

pub fn can_edit_pet(rol: Rol) -> bool {
    has_permission(rol, Section::Mascotas)
}

pub fn can_delete_pet(rol: Rol) -> bool {
    has_permission(rol, Section::Mascotas)
}

pub fn can_cancel_appointment(rol: Rol) -> bool {
    has_permission(rol, Section::Citas)
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub icon: &'static str,
    pub text: &'static str,
    pub page: Page,
    pub path: &'static str,
    pub active: bool,
}

fn item(icon: &'static str, text: &'static str, page: Page) -> MenuItem {
    MenuItem { icon, text, page, path: page.path(), active: false }
}

pub fn menu_for(rol: Rol) -> Vec<MenuItem> {
    let mut menu = vec![item("🏠", "Dashboard", Page::Dashboard)];

    match rol {
        Rol::Admin => menu.extend([
            item("👥", "Usuarios", Page::Usuarios),
            item("🐕", "Mascotas", Page::Mascotas),
            item("📋", "Historiales", Page::Historial),
            item("📅", "Citas", Page::Citas),
            item("👤", "Mi Perfil", Page::Perfil),
        ]),
        Rol::Veterinario => menu.extend([
            item("🐾", "Mascotas", Page::Mascotas),
            item("🏥", "Historiales", Page::Historial),
            item("📋", "Citas", Page::Citas),
            item("👨‍⚕️", "Mi Perfil", Page::Perfil),
        ]),
        Rol::Recepcionista => menu.extend([
            item("👥", "Usuarios", Page::Usuarios),
            item("📞", "Citas", Page::Citas),
            item("👤", "Mi Perfil", Page::Perfil),
        ]),
        Rol::Cliente => menu.extend([
            item("🐕", "Mis Mascotas", Page::Mascotas),
            item("📅", "Mis Citas", Page::Citas),
            item("📋", "Historial Médico", Page::Historial),
            item("👤", "Mi Perfil", Page::Perfil),
        ]),
    }

    menu
}

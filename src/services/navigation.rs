use serde::Serialize;

use crate::domain::usuario::model::{Rol, Usuario};
use crate::services::permissions::{has_permission, MenuItem, Section};

pub const NO_PERMISSION: &str = "No tienes permisos para acceder a esta página";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Index,
    Login,
    Registro,
    Dashboard,
    Usuarios,
    Mascotas,
    Historial,
    Citas,
    Perfil,
}

impl Page {

    pub const ALL: [Page; 9] = [
        Page::Index,
        Page::Login,
        Page::Registro,
        Page::Dashboard,
        Page::Usuarios,
        Page::Mascotas,
        Page::Historial,
        Page::Citas,
        Page::Perfil,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Index => "/",
            Page::Login => "/login",
            Page::Registro => "/registro",
            Page::Dashboard => "/dashboard",
            Page::Usuarios => "/usuarios",
            Page::Mascotas => "/mascotas",
            Page::Historial => "/historial",
            Page::Citas => "/citas",
            Page::Perfil => "/perfil",
        }
    }

    /// Accepts `/mascotas`, `mascotas.html` and `views/mascotas.html`.
    pub fn from_path(path: &str) -> Option<Page> {
        let name = path
            .trim()
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("index");
        let name = name.strip_suffix(".html").unwrap_or(name).to_lowercase();

        match name.as_str() {
            "index" => Some(Page::Index),
            "login" => Some(Page::Login),
            "registro" => Some(Page::Registro),
            "dashboard" => Some(Page::Dashboard),
            "usuarios" => Some(Page::Usuarios),
            "mascotas" => Some(Page::Mascotas),
            "historial" | "historiales" => Some(Page::Historial),
            "citas" => Some(Page::Citas),
            "perfil" => Some(Page::Perfil),
            _ => None,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Page::Index | Page::Login | Page::Registro)
    }

    pub fn section(&self) -> Option<Section> {
        match self {
            Page::Usuarios => Some(Section::Usuarios),
            Page::Mascotas => Some(Section::Mascotas),
            Page::Historial => Some(Section::Historiales),
            Page::Citas => Some(Section::Citas),
            Page::Perfil => Some(Section::Perfil),
            Page::Index | Page::Login | Page::Registro | Page::Dashboard => None,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Navigation {
    Allow,
    Redirect {
        to: Page,
        path: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Navigation {

    fn redirect(to: Page, message: Option<&str>) -> Self {
        Navigation::Redirect {
            to,
            path: to.path(),
            message: message.map(str::to_string),
        }
    }
}

pub fn protect_page(usuario: Option<&Usuario>, page: Page) -> Navigation {
    if page.is_public() {
        return Navigation::Allow;
    }

    let usuario = match usuario {
        Some(usuario) => usuario,
        None => return Navigation::redirect(Page::Login, None),
    };

    match page.section() {
        Some(section) if !has_permission(usuario.rol, section) => {
            log::warn!("{} ({}) denied access to {:?}", usuario.email, usuario.rol.as_str(), page);
            Navigation::redirect(Page::Dashboard, Some(NO_PERMISSION))
        },
        _ => Navigation::Allow,
    }
}

pub fn redirect_by_role(rol: Option<Rol>) -> Page {
    match rol {
        Some(_) => Page::Dashboard,
        None => Page::Login,
    }
}

pub fn mark_active(menu: Vec<MenuItem>, page: Page) -> Vec<MenuItem> {
    menu.into_iter()
        .map(|mut entry| {
            entry.active = entry.page == page;
            entry
        })
        .collect()
}

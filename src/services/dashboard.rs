use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::cita::model::Cita;
use crate::domain::historial::model::Historial;
use crate::domain::mascota::model::Mascota;
use crate::domain::session::model::Session;
use crate::domain::usuario::model::{Rol, Usuario};
use crate::infrastructure::http::endpoints::{CITAS, HISTORIALES, MASCOTAS, USUARIOS};
use crate::services::data_loader::LoadOptions;
use crate::services::navigation::{mark_active, Page};
use crate::services::permissions::{menu_for, MenuItem};
use crate::utils::format::parse_date;

#[derive(Serialize, Debug)]
pub struct DashboardUser {
    pub nombre: String,
    pub rol: Rol,
    pub rol_display: &'static str,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Stat {
    pub key: &'static str,
    pub label: &'static str,
    pub value: Option<usize>,
}

#[derive(Serialize, Debug)]
pub struct DashboardView {
    pub usuario: DashboardUser,
    pub menu: Vec<MenuItem>,
    pub cards: Vec<MenuItem>,
    pub stats: Vec<Stat>,
}

pub fn cards_for(rol: Rol) -> Vec<MenuItem> {
    menu_for(rol)
        .into_iter()
        .filter(|item| item.page != Page::Dashboard)
        .collect()
}

async fn fetch<T: DeserializeOwned>(session: &Session, endpoint: &str, key: &str, error: &str) -> Option<Vec<T>> {
    let envelope = session
        .loader
        .load_data(&session.token, endpoint, LoadOptions::with_error(error))
        .await
        .ok()?;

    match envelope.list::<T>(key) {
        Ok(items) => Some(items),
        Err(e) => {
            log::warn!("Dashboard could not read {}: {}", endpoint, e);
            None
        }
    }
}

async fn count<T: DeserializeOwned>(session: &Session, endpoint: &str, key: &str, error: &str) -> Option<usize> {
    fetch::<T>(session, endpoint, key, error).await.map(|items| items.len())
}

async fn citas(session: &Session) -> Option<Vec<Cita>> {
    fetch(session, CITAS, "citas", "Error al cargar las citas").await
}

/// A stat that fails to load is reported as `null`; the rest still render.
pub async fn stats_for(session: &Session, rol: Rol, today: NaiveDate) -> Vec<Stat> {
    let pending = |citas: Vec<Cita>| citas.iter().filter(|c| c.estado.is_pending()).count();

    match rol {
        Rol::Cliente => vec![
            Stat {
                key: "mascotas",
                label: "Mis mascotas",
                value: count::<Mascota>(session, MASCOTAS, "mascotas", "Error al cargar las mascotas").await,
            },
            Stat {
                key: "citas_pendientes",
                label: "Citas pendientes",
                value: citas(session).await.map(pending),
            },
        ],
        Rol::Veterinario => vec![
            Stat {
                key: "citas_hoy",
                label: "Citas de hoy",
                value: citas(session).await.map(|citas| {
                    citas
                        .iter()
                        .filter(|c| parse_date(&c.fecha) == Some(today))
                        .count()
                }),
            },
            Stat {
                key: "historiales",
                label: "Historiales",
                value: count::<Historial>(session, HISTORIALES, "historiales", "Error al cargar los historiales médicos").await,
            },
        ],
        Rol::Recepcionista => vec![
            Stat {
                key: "citas_pendientes",
                label: "Citas pendientes",
                value: citas(session).await.map(pending),
            },
            Stat {
                key: "usuarios",
                label: "Usuarios",
                value: count::<Usuario>(session, USUARIOS, "usuarios", "Error al cargar los usuarios").await,
            },
        ],
        Rol::Admin => vec![
            Stat {
                key: "usuarios",
                label: "Usuarios",
                value: count::<Usuario>(session, USUARIOS, "usuarios", "Error al cargar los usuarios").await,
            },
            Stat {
                key: "mascotas",
                label: "Mascotas",
                value: count::<Mascota>(session, MASCOTAS, "mascotas", "Error al cargar las mascotas").await,
            },
            Stat {
                key: "citas",
                label: "Citas",
                value: citas(session).await.map(|citas| citas.len()),
            },
            Stat {
                key: "historiales",
                label: "Historiales",
                value: count::<Historial>(session, HISTORIALES, "historiales", "Error al cargar los historiales médicos").await,
            },
        ],
    }
}

pub async fn build_dashboard(session: &Session, today: NaiveDate) -> DashboardView {
    let usuario = session.usuario();
    let rol = usuario.rol;

    DashboardView {
        usuario: DashboardUser {
            nombre: if usuario.nombre.trim().is_empty() { "Usuario".to_string() } else { usuario.nombre },
            rol,
            rol_display: rol.display_name(),
        },
        menu: mark_active(menu_for(rol), Page::Dashboard),
        cards: cards_for(rol),
        stats: stats_for(session, rol, today).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::backend_client::BackendClient;
    use std::time::Duration;

    fn session(rol: Rol) -> Session {
        // Nothing listens on port 9; every uncached stat fails.
        let client = BackendClient::init("http://127.0.0.1:9/api", Duration::from_millis(200)).unwrap();
        Session::new(
            "token".to_string(),
            Usuario { nombre: "Marta".to_string(), rol, ..Default::default() },
            client,
        )
    }

    #[test]
    fn test_cards_skip_dashboard() {
        let cards = cards_for(Rol::Recepcionista);
        let pages: Vec<Page> = cards.iter().map(|c| c.page).collect();
        assert_eq!(pages, vec![Page::Usuarios, Page::Citas, Page::Perfil]);
    }

    #[tokio::test]
    async fn test_failed_stats_render_as_null() {
        let session = session(Rol::Cliente);
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let view = build_dashboard(&session, today).await;

        assert_eq!(view.usuario.rol_display, "Cliente");
        assert!(view.menu[0].active);
        assert_eq!(view.stats.len(), 2);
        assert!(view.stats.iter().all(|s| s.value.is_none()));

        let body = serde_json::to_value(&view).unwrap();
        assert!(body["stats"][0]["value"].is_null());
    }
}

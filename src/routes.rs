use actix_web::web;

use crate::api::handlers::{
    auth_handlers::{login, logout, registro},
    cita_handlers::{cancel_cita, cita_opciones, create_cita, delete_cita, get_cita, list_citas, update_cita},
    dashboard_handlers::dashboard,
    historial_handlers::{create_historial, delete_historial, get_historial, historial_opciones, list_historiales, update_historial},
    mascota_handlers::{create_mascota, delete_mascota, get_mascota, list_mascotas, update_mascota},
    misc_handlers::{clear_cache, health, index, navigation, notifications},
    perfil_handlers::{change_password, export_perfil, get_perfil, update_perfil},
    usuario_handlers::{create_usuario, delete_usuario, get_usuario, list_usuarios, update_usuario},
};
use crate::utils::security::SessionGuard;

pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
    );

    cfg.service(
        web::resource("/health")
            .route(web::get().to(health))
    );

    cfg.service(
        web::resource("/auth/login")
            .route(web::post().to(login))
    );

    cfg.service(
        web::resource("/auth/registro")
            .route(web::post().to(registro))
    );
}

/// Everything here sits behind the session cookie. Register after
/// `public_routes`: the scope has no prefix and answers any path left over.
pub fn private_routes(cfg: &mut web::ServiceConfig, guard: SessionGuard) {
    cfg.service(
        web::scope("")
            .wrap(guard)
            .service(web::resource("/auth/logout").route(web::post().to(logout)))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/navigation/{page}").route(web::get().to(navigation)))
            .service(web::resource("/notifications").route(web::get().to(notifications)))
            .service(web::resource("/cache").route(web::delete().to(clear_cache)))
            .service(
                web::resource("/mascotas")
                    .route(web::get().to(list_mascotas))
                    .route(web::post().to(create_mascota))
            )
            .service(
                web::resource("/mascotas/{id}")
                    .route(web::get().to(get_mascota))
                    .route(web::put().to(update_mascota))
                    .route(web::delete().to(delete_mascota))
            )
            .service(
                web::resource("/citas")
                    .route(web::get().to(list_citas))
                    .route(web::post().to(create_cita))
            )
            .service(web::resource("/citas/opciones").route(web::get().to(cita_opciones)))
            .service(web::resource("/citas/{id}/cancelar").route(web::post().to(cancel_cita)))
            .service(
                web::resource("/citas/{id}")
                    .route(web::get().to(get_cita))
                    .route(web::put().to(update_cita))
                    .route(web::delete().to(delete_cita))
            )
            .service(
                web::resource("/historiales")
                    .route(web::get().to(list_historiales))
                    .route(web::post().to(create_historial))
            )
            .service(web::resource("/historiales/opciones").route(web::get().to(historial_opciones)))
            .service(
                web::resource("/historiales/{id}")
                    .route(web::get().to(get_historial))
                    .route(web::put().to(update_historial))
                    .route(web::delete().to(delete_historial))
            )
            .service(
                web::resource("/usuarios")
                    .route(web::get().to(list_usuarios))
                    .route(web::post().to(create_usuario))
            )
            .service(
                web::resource("/usuarios/{id}")
                    .route(web::get().to(get_usuario))
                    .route(web::put().to(update_usuario))
                    .route(web::delete().to(delete_usuario))
            )
            .service(
                web::resource("/perfil")
                    .route(web::get().to(get_perfil))
                    .route(web::put().to(update_perfil))
            )
            .service(web::resource("/perfil/password").route(web::post().to(change_password)))
            .service(web::resource("/perfil/exportar").route(web::get().to(export_perfil)))
    );
}

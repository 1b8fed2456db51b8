use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use patitas_web::{
    api::state::AppState,
    domain::session::repository::SessionStore,
    infrastructure::{http::backend_client::BackendClient, memory::session_store::InMemorySessionStore},
    routes::{private_routes, public_routes},
    utils::config::AppConfig,
};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> std::io::Result<()> {

    let config = AppConfig::global();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();

    for warning in &config.warnings {
        log::warn!("{}", warning);
    }

    let client = match BackendClient::init(&config.api_base_url, config.request_timeout) {
        Ok(client) => client.with_debug(config.debug),
        Err(e) => {
            log::error!("Invalid clinic API configuration: {}", e);
            std::process::exit(1);
        }
    };

    let sessions: Arc<dyn SessionStore> = Arc::new(
        InMemorySessionStore::new(client.clone()).with_idle_ttl(config.session_ttl)
    );

    let purge_store = Arc::clone(&sessions);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = purge_store.purge_expired(Utc::now()).await {
                log::error!("Session purge failed: {}", e);
            }
        }
    });

    let app_state = AppState::new(client, sessions, &config.session_cookie);

    log::info!(
        "🚀 Server running at http://{} ({:?}, clinic API at {})",
        config.bind_address,
        config.environment,
        config.api_base_url
    );

    HttpServer::new(move || {
        let guard = app_state.guard();
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(app_state.clone()))
            .configure(public_routes)
            .configure(|cfg| private_routes(cfg, guard))
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await
}

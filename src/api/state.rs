use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite};

use crate::domain::session::repository::SessionStore;
use crate::infrastructure::http::backend_client::BackendClient;
use crate::utils::security::SessionGuard;

#[derive(Clone)]
pub struct AppState {
    pub client: BackendClient,
    pub sessions: Arc<dyn SessionStore>,
    pub cookie_name: Arc<String>,
}

impl AppState {

    pub fn new(client: BackendClient, sessions: Arc<dyn SessionStore>, cookie_name: &str) -> Self {
        AppState {
            client,
            sessions,
            cookie_name: Arc::new(cookie_name.to_string()),
        }
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard {
            store: Arc::clone(&self.sessions),
            cookie_name: Arc::clone(&self.cookie_name),
        }
    }

    pub fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        Cookie::build(self.cookie_name.to_string(), session_id)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish()
    }

    pub fn expired_session_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}

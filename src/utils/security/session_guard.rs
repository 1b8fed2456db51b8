use actix_web::{dev::{Payload, ServiceRequest, ServiceResponse}, FromRequest, HttpMessage, HttpRequest};
use std::{ops::Deref, rc::Rc, sync::Arc, task::{Context, Poll}};
use actix_web::Error;
use actix_service::{Service, Transform};
use chrono::Utc;
use futures::future::{ok, ready, LocalBoxFuture, Ready};

use crate::domain::session::{model::Session, repository::SessionStore};
use crate::infrastructure::http::backend_client::SESSION_EXPIRED;
use crate::utils::errors::ApiError;

pub const LOGIN_REQUIRED: &str = "Debes iniciar sesión para acceder a esta información";

/// Resolves the session cookie to a live `Session` and puts it in the request
/// extensions.
pub struct SessionGuard {
    pub store: Arc<dyn SessionStore>,
    pub cookie_name: Arc<String>,
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionGuardService {
            service: Rc::new(service),
            store: Arc::clone(&self.store),
            cookie_name: Arc::clone(&self.cookie_name),
        })
    }
}

pub struct SessionGuardService<S> {
    service: Rc<S>,
    store: Arc<dyn SessionStore>,
    cookie_name: Arc<String>,
}

impl<S, B> Service<ServiceRequest> for SessionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let store = Arc::clone(&self.store);

        let session_id = match req.cookie(&self.cookie_name) {
            Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
            _ => {
                return Box::pin(async {
                    Err(ApiError::Unauthorized(LOGIN_REQUIRED.to_string()).into())
                })
            }
        };

        Box::pin(async move {
            let session = match store.get(&session_id).await? {
                Some(session) => session,
                None => return Err(ApiError::Unauthorized(LOGIN_REQUIRED.to_string()).into()),
            };

            let now = Utc::now();
            if session.is_expired(now) {
                store.remove(&session_id).await?;
                log::info!("Session {} rejected: token expired", session_id);
                return Err(ApiError::Unauthorized(SESSION_EXPIRED.to_string()).into());
            }

            session.touch(now);

            req.extensions_mut().insert(session);
            service.call(req).await
        })
    }
}

/// Extractor for the session the guard attached to the request.
pub struct CurrentSession(pub Arc<Session>);

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl FromRequest for CurrentSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.extensions().get::<Arc<Session>>().cloned();
        ready(
            session
                .map(CurrentSession)
                .ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string())),
        )
    }
}

// TESTING

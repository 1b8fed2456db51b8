use actix_web::Responder;

use crate::api::handlers::{screen, today};
use crate::services::dashboard::build_dashboard;
use crate::utils::security::CurrentSession;

pub async fn dashboard(session: CurrentSession) -> impl Responder {
    let view = build_dashboard(&session, today()).await;
    screen(&session, view)
}

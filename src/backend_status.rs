use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

use crate::app_config::BackendSettings;

#[derive(Serialize)]
struct BackendStatus<'a> {
  configured: bool,
  url: Option<&'a str>,
}

/// Reports whether the backend client has what it needs to connect. The
/// access key itself is never echoed back.
#[get("/backend/status")]
pub async fn status(settings: web::Data<BackendSettings>) -> impl Responder {
  HttpResponse::Ok().json(BackendStatus {
    configured: settings.is_configured(),
    url: settings.url.as_deref(),
  })
}

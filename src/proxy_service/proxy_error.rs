use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

const FAILURE_LABEL: &str = "Proxy request failed";

/// Failures raised while resolving or forwarding a proxied request.
///
/// All kinds collapse into the same 500 response; only the message text differs.
#[derive(Error, Debug)]
pub enum ProxyError {
  #[error("URL parameter is required")]
  MissingParameter,

  #[error("Invalid URL format")]
  InvalidUrl,

  #[error("{0}")]
  UpstreamFailure(String),

  #[error("Upstream request timed out after {} ms", .0.as_millis())]
  Timeout(Duration),
}

impl From<reqwest::Error> for ProxyError {
  fn from(err: reqwest::Error) -> Self {
    ProxyError::UpstreamFailure(err.to_string())
  }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
  error: &'a str,
  message: String,
}

impl ResponseError for ProxyError {
  fn status_code(&self) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
  }

  // No Access-Control-Allow-Origin here, unlike the success path.
  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code()).json(ErrorBody {
      error: FAILURE_LABEL,
      message: self.to_string(),
    })
  }
}

use actix_web::web::Query;
use log::warn;

use crate::proxy_service::proxy_error::ProxyError;

const TARGET_PARAM: &str = "url";

/// Pulls the caller's target out of the query string. The value is decoded
/// once by the form parser and returned as is; whether it is an absolute URL
/// is the forwarder's concern.
pub fn resolve_target(query_string: &str) -> Result<String, ProxyError> {
  let pairs = match Query::<Vec<(String, String)>>::from_query(query_string) {
    Ok(query_params) => query_params.into_inner(),
    Err(err) => {
      warn!("Unable to parse query parameters {}", err);
      Vec::new()
    }
  };

  pairs
    .into_iter()
    .find(|(name, _)| name == TARGET_PARAM)
    .map(|(_, value)| value)
    .filter(|value| !value.is_empty())
    .ok_or(ProxyError::MissingParameter)
}

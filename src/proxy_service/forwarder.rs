use std::sync::Arc;
use std::time::Instant;

use actix_web::rt::time;
use bytes::Bytes;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode, Url};

use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_error::ProxyError;

/// A completed upstream exchange, body fully read.
#[derive(Debug)]
pub struct UpstreamResponse {
  pub status: StatusCode,
  pub headers: HeaderMap,
  pub body: Bytes,
}

pub struct Forwarder {
  config: Arc<ProxyConfig>,
  http_client: Client,
}

impl Forwarder {
  pub fn new(http_client: Client, config: Arc<ProxyConfig>) -> Self {
    Self {
      config,
      http_client,
    }
  }

  pub fn config(&self) -> &ProxyConfig {
    &self.config
  }

  /// Issues one GET against `target`. Upstream error statuses are returned as
  /// regular responses; only transport failures and the timeout are errors.
  pub async fn forward(&self, target: &str) -> Result<UpstreamResponse, ProxyError> {
    let url = Url::parse(target).map_err(|_| ProxyError::InvalidUrl)?;
    let builder = self.http_client.get(url).headers(self.config.header_map());
    let timeout = self.config.timeout;
    let started = Instant::now();

    // Dropping the fetch future on expiry aborts the connection.
    let result = match time::timeout(timeout, Forwarder::fetch(builder)).await {
      Ok(result) => result,
      Err(_) => Err(ProxyError::Timeout(timeout)),
    };

    match &result {
      Ok(response) => debug!("GET {} -> {} in {:?}", target, response.status, started.elapsed()),
      Err(err) => debug!("GET {} failed in {:?}: {}", target, started.elapsed(), err),
    }

    result
  }

  async fn fetch(builder: RequestBuilder) -> Result<UpstreamResponse, ProxyError> {
    let response = builder.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    Ok(UpstreamResponse {
      status,
      headers,
      body,
    })
  }
}

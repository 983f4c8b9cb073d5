use std::sync::Arc;
use reqwest::Client;
use crate::proxy_service::forwarder::Forwarder;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_factory::ProxyRouteServiceFactory;

pub mod forwarder;
pub mod proxy_config;
pub mod proxy_error;
pub mod proxy_factory;
pub mod proxy_route_service;
pub mod url_resolver;

/// Builds the `/proxy` middleware around a shared outbound client.
pub fn middleware(http_client: Client, config: ProxyConfig) -> ProxyRouteServiceFactory {
  let forwarder = Forwarder::new(http_client, Arc::new(config));
  ProxyRouteServiceFactory::create(Arc::new(forwarder))
}

use std::sync::Arc;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures_util::future::{ready, Ready};
use crate::proxy_service::forwarder::Forwarder;
use crate::proxy_service::proxy_route_service::ProxyRouteService;

/// Middleware that answers `/proxy` requests itself and hands every other
/// request to the wrapped service.
#[derive(Clone)]
pub struct ProxyRouteServiceFactory {
  pub forwarder: Arc<Forwarder>,
}

impl<S, B> Transform<S, ServiceRequest> for ProxyRouteServiceFactory
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Transform = ProxyRouteService<S>;
  type InitError = ();
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(ProxyRouteService {
      next: service,
      forwarder: self.forwarder.clone(),
    }))
  }
}

impl ProxyRouteServiceFactory {
  pub fn create(forwarder: Arc<Forwarder>) -> Self {
    Self { forwarder }
  }
}

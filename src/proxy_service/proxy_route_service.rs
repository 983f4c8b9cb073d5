use std::sync::Arc;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use actix_web::{Error, HttpResponse, ResponseError};
use futures_core::future::LocalBoxFuture;
use log::warn;
use crate::proxy_service::forwarder::{Forwarder, UpstreamResponse};
use crate::proxy_service::proxy_error::ProxyError;
use crate::proxy_service::url_resolver::resolve_target;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

pub struct ProxyRouteService<S> {
  pub(super) next: S,
  pub(super) forwarder: Arc<Forwarder>,
}

impl<S, B> Service<ServiceRequest> for ProxyRouteService<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::forward_ready!(next);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    if !self.forwarder.config().matches(req.path()) {
      let next = self.next.call(req);
      return Box::pin(async move { next.await.map(ServiceResponse::map_into_left_body) });
    }

    // The inbound payload is dropped unread.
    let (http_request, _) = req.into_parts();
    let forwarder = self.forwarder.clone();

    Box::pin(async move {
      let response = match exec(&forwarder, http_request.query_string()).await {
        Ok(upstream) => relay(upstream),
        Err(err) => {
          warn!("Proxy request for '{}' failed: {}", http_request.uri(), err);
          err.error_response()
        }
      };

      Ok(ServiceResponse::new(http_request, response).map_into_right_body())
    })
  }
}

async fn exec(forwarder: &Forwarder, query_string: &str) -> Result<UpstreamResponse, ProxyError> {
  let target = resolve_target(query_string)?;
  forwarder.forward(&target).await
}

fn relay(upstream: UpstreamResponse) -> HttpResponse<BoxBody> {
  let UpstreamResponse { status, headers, body } = upstream;
  let content_type = headers
    .get(CONTENT_TYPE)
    .cloned()
    .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

  HttpResponse::build(status)
    .insert_header((ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")))
    .insert_header((CONTENT_TYPE, content_type))
    .body(body)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::proxy_service::forwarder::tests::{forwarder_with_timeout, spawn_upstream};
  use crate::proxy_service::proxy_factory::ProxyRouteServiceFactory;
  use reqwest::header::HeaderMap;
  use actix_web::http::StatusCode;
  use actix_web::{test, web, App};
  use bytes::Bytes;
  use serde::Deserialize;
  use std::time::Duration;

  #[derive(Deserialize)]
  struct ErrorBody {
    error: String,
    message: String,
  }

  async fn passthrough() -> HttpResponse {
    HttpResponse::Ok().body("from next")
  }

  fn encoded(target: &str) -> String {
    target
      .replace('%', "%25")
      .replace(':', "%3A")
      .replace('/', "%2F")
      .replace('?', "%3F")
      .replace('&', "%26")
      .replace('=', "%3D")
  }

  macro_rules! proxy_app {
    ($forwarder:expr) => {
      test::init_service(
        App::new()
          .wrap(ProxyRouteServiceFactory::create(Arc::new($forwarder)))
          .route("/other", web::to(passthrough))
          .route("/proxy/route", web::to(passthrough)),
      )
      .await
    };
  }

  #[actix_web::test]
  async fn non_matching_paths_pass_through() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let uri = format!("/other?url={}", encoded(&upstream.url("/data")));
    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(test::read_body(res).await, Bytes::from_static(b"from next"));

    let res = test::call_service(&app, test::TestRequest::get().uri("/missing-route").to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(upstream.hits(), 0);
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn matching_paths_are_never_delegated() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let uri = format!("/proxy/route?url={}", encoded(&upstream.url("/data")));
    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(test::read_body(res).await, Bytes::from_static(br#"{"ok":true}"#));
    assert_eq!(upstream.hits(), 1);
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn relays_success_with_cors() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let uri = format!("/proxy?url={}", encoded(&upstream.url("/data")));
    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(test::read_body(res).await, Bytes::from_static(br#"{"ok":true}"#));
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn relays_upstream_not_found_verbatim() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let uri = format!("/proxy?url={}", encoded(&upstream.url("/missing")));
    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(test::read_body(res).await, Bytes::from_static(b"not found"));
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn any_inbound_method_is_forwarded_as_get() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let uri = format!("/proxy?url={}", encoded(&upstream.url("/data")));
    let req = test::TestRequest::post().uri(&uri).set_payload("ignored").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(upstream.hits(), 1);
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn missing_parameter_is_uniform_error() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let res = test::call_service(&app, test::TestRequest::get().uri("/proxy").to_request()).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(
      test::read_body(res).await,
      Bytes::from_static(br#"{"error":"Proxy request failed","message":"URL parameter is required"}"#)
    );
    assert_eq!(upstream.hits(), 0);
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn invalid_url_is_uniform_error() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let res = test::call_service(&app, test::TestRequest::get().uri("/proxy?url=not-a-url").to_request()).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = test::read_body_json(res).await;
    assert_eq!(body.error, "Proxy request failed");
    assert_eq!(body.message, "Invalid URL format");
    assert_eq!(upstream.hits(), 0);
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn timeout_is_uniform_error() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_millis(200)));

    let uri = format!("/proxy?url={}", encoded(&upstream.url("/slow")));
    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = test::read_body_json(res).await;
    assert_eq!(body.error, "Proxy request failed");
    assert_eq!(body.message, "Upstream request timed out after 200 ms");
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn unreachable_upstream_is_uniform_error() {
    let upstream = spawn_upstream().await;
    let uri = format!("/proxy?url={}", encoded(&upstream.url("/data")));
    upstream.stop().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    let body: ErrorBody = test::read_body_json(res).await;
    assert_eq!(body.error, "Proxy request failed");
    assert!(!body.message.is_empty());
  }

  #[actix_web::test]
  async fn repeated_requests_are_not_cached() {
    let upstream = spawn_upstream().await;
    let app = proxy_app!(forwarder_with_timeout(Duration::from_secs(5)));

    let uri = format!("/proxy?url={}", encoded(&upstream.url("/data")));
    for _ in 0..2 {
      let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
      assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(upstream.hits(), 2);
    upstream.stop().await;
  }

  #[actix_web::test]
  async fn relay_defaults_content_type() {
    let upstream = UpstreamResponse {
      status: StatusCode::CREATED,
      headers: HeaderMap::new(),
      body: Bytes::from_static(b"{}"),
    };

    let response = relay(upstream);

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
  }
}

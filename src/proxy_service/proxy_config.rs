use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

pub const PROXY_PATH_PREFIX: &str = "/proxy";
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_millis(15000);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const UPSTREAM_ACCEPT: &str = "application/json, text/plain, */*";

#[derive(Clone)]
pub struct Header {
  pub name: HeaderName,
  pub value: HeaderValue,
}

/// Process-wide settings for outbound calls. Built once at startup and never
/// mutated afterwards.
pub struct ProxyConfig {
  pub path_prefix: Box<str>,
  pub headers: Box<[Header]>,
  pub timeout: Duration,
}

impl Default for ProxyConfig {
  fn default() -> Self {
    let headers = vec![
      Header {
        name: USER_AGENT,
        value: HeaderValue::from_static(BROWSER_USER_AGENT),
      },
      Header {
        name: ACCEPT,
        value: HeaderValue::from_static(UPSTREAM_ACCEPT),
      },
    ];

    ProxyConfig {
      path_prefix: Box::from(PROXY_PATH_PREFIX),
      headers: headers.into_boxed_slice(),
      timeout: UPSTREAM_TIMEOUT,
    }
  }
}

impl ProxyConfig {
  pub fn matches(&self, path: &str) -> bool {
    path.starts_with(self.path_prefix.as_ref())
  }

  pub fn header_map(&self) -> HeaderMap {
    let mut header_map = HeaderMap::with_capacity(self.headers.len());

    for header in self.headers.iter() {
      header_map.insert(&header.name, header.value.clone());
    }

    header_map
  }
}

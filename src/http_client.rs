use reqwest::redirect::Policy;
use reqwest::Client;

/// Settings for the outbound client shared by every forwarded call.
///
/// Without a cookie store nothing carries over between calls, and with
/// `reuse_connections` off each call opens its own connection.
#[derive(Default)]
pub struct HttpClientConfig {
  pub reuse_connections: bool,
}

impl HttpClientConfig {
  pub fn to_client(self) -> Result<Client, reqwest::Error> {
    let HttpClientConfig { reuse_connections } = self;
    let mut client_builder = reqwest::ClientBuilder::new();

    if !reuse_connections {
      client_builder = client_builder.pool_max_idle_per_host(0);
    }

    let client = client_builder.redirect(Policy::default()).build()?;

    Ok(client)
  }
}

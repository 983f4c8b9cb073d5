mod app_config;
mod backend_status;
mod http_client;
mod proxy_service;
mod std_logger;

use std::env;
use std::io::{ErrorKind, Result};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;
use app_config::{AppConfig, Cli};
use http_client::HttpClientConfig;
use proxy_service::proxy_config::ProxyConfig;

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: AppConfig = AppConfig::load(&cli, |key| env::var(key).ok())?;

    std_logger::init(config.log_level)
        .map_err(|error| std::io::Error::new(ErrorKind::Other, error.to_string()))?;

    config.backend.report();

    let http_client = HttpClientConfig::default()
        .to_client()
        .map_err(|error| std::io::Error::new(ErrorKind::Other, error))?;

    let proxy = proxy_service::middleware(http_client, ProxyConfig::default());
    let backend = web::Data::new(config.backend.clone());

    info!("Listening on {}:{} with {} workers.", config.bind, config.port, config.workers);

    HttpServer::new(move || {
        App::new()
            .wrap(proxy.clone())
            .wrap(Logger::default())
            .app_data(backend.clone())
            .service(backend_status::status)
    })
        .workers(config.workers)
        .bind((config.bind, config.port))?
        .run()
        .await
}

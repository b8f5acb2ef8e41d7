mod analytics;
mod config;
mod db;
mod handlers;
mod middlewares;
mod models;
mod routes;
mod services;
mod state;
mod structs;
#[cfg(test)]
mod test_support;
mod utils;

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::db::DocumentStore;
use crate::db::memory::MemoryStore;
use crate::db::mongodb::{MongoStore, get_database};
use crate::services::geo::{ExternalIpLocator, ExternalReverseGeocoder, build_http_client};
use crate::state::app_state::AppState;
use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware::Logger, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};
use routes::init_routes;

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Mongo => {
            let db = get_database(config).await?;
            Ok(Arc::new(MongoStore::new(db)))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; visits are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize the document store
    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Error connecting to the database: {:#}", e);
            std::process::exit(1);
        }
    };

    let http_client = match build_http_client(config.http_timeout) {
        Ok(client) => client,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };
    let ip_locator = Arc::new(ExternalIpLocator::new(
        http_client.clone(),
        &config.ip_lookup_url,
    ));
    let geocoder = Arc::new(ExternalReverseGeocoder::new(
        http_client,
        &config.reverse_geocode_url,
    ));

    let bind_addr = (config.host_addr.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();

    // Create shared state
    let app_state = web::Data::new(AppState::new(config, store, ip_locator, geocoder));

    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);
    HttpServer::new(move || {
        let logger = Logger::new("%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %D ms");
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .max_age(3600);
        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(init_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}

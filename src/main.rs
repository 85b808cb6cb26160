use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use caucus::config::{cors_middleware, ServerConfig};
use caucus::registry::RoomRegistry;
use caucus::{health, telemetry, ws};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    info!(host = %config.host, port = config.port, "starting caucus server");

    let registry = web::Data::new(Arc::new(RoomRegistry::new()));

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .app_data(registry.clone())
            .route("/ws", web::get().to(ws::session::upgrade))
            .configure(health::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

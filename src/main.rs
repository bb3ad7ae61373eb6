pub mod app;
pub mod config;
pub mod database;
pub mod schema;

mod auth;
mod blogs;
mod routes;

use std::io;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use log::{error, info};

use app::AppState;
use config::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        error!("{e}");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let app_state = AppState::new(&config).map_err(|e| {
        error!("could not start: {e:?}");
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    info!("Server running on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(Data::new(app_state.clone()))
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

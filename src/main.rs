mod auth;
mod comment;
mod config;
mod db;
mod entity;
mod error;
mod response;
mod routes;
#[cfg(test)]
mod test_support;

use actix_web::{middleware, web, App, HttpServer};
use comment::CommentService;
use config::AppConfig;
use db::connect_db;
use log::info;
use response::{json_error_handler, query_error_handler};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config).await;
    let service = CommentService::new(db.clone(), config.store_timeout(), config.page_size_max);
    let server_port = config.server_port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(service.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .wrap(middleware::Logger::default())
            .wrap(actix_web::middleware::from_fn(routes::cors::cors_handler))
            .service(web::scope("/api").service(web::scope("/comment").configure(routes::comment::config)))
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}

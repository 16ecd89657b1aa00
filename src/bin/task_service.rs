//! Task service: per-user task CRUD behind bearer-token authentication.

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use task_manager::{
    auth::JwtKeys,
    config::Config,
    db,
    repository::{PgTaskRepository, TaskRepository},
    routes::{
        self,
        health::{self, ServiceName},
    },
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env().map_err(io::Error::other)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pool = db::create_pool(&config.database)
        .await
        .map_err(io::Error::other)?;
    db::run_migrations(&pool).await.map_err(io::Error::other)?;

    let tasks: web::Data<dyn TaskRepository> =
        web::Data::from(Arc::new(PgTaskRepository::new(pool)) as Arc<dyn TaskRepository>);
    let keys = web::Data::new(JwtKeys::new(&config.jwt.secret));

    log::info!(
        "Starting task service at http://{}:{}",
        config.server.host,
        config.server.task_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(tasks.clone())
            .app_data(keys.clone())
            .app_data(web::Data::new(ServiceName("task-service")))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::task_config)
    })
    .bind((config.server.host.as_str(), config.server.task_port))?
    .run()
    .await
}

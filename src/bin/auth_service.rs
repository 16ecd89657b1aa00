//! Auth service: REST registration/login/refresh plus the JSON-RPC endpoint on its own port.

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use task_manager::{
    auth::{JwtKeys, TokenIssuer},
    config::Config,
    db,
    repository::{PgUserRepository, UserRepository},
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

    let users: web::Data<dyn UserRepository> =
        web::Data::from(Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>);
    let issuer = web::Data::new(TokenIssuer::new(
        JwtKeys::new(&config.jwt.secret),
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));

    let host = config.server.host.clone();
    log::info!(
        "Starting auth service at http://{}:{} (rpc on port {})",
        host,
        config.server.auth_port,
        config.server.rpc_port
    );

    let rest = {
        let users = users.clone();
        let issuer = issuer.clone();
        HttpServer::new(move || {
            App::new()
                .app_data(users.clone())
                .app_data(issuer.clone())
                .app_data(web::Data::new(ServiceName("auth-service")))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .configure(routes::auth_config)
        })
        .bind((host.as_str(), config.server.auth_port))?
        .run()
    };

    let rpc = HttpServer::new(move || {
        App::new()
            .app_data(users.clone())
            .app_data(issuer.clone())
            .wrap(Logger::default())
            .configure(routes::rpc_config)
    })
    .bind((host.as_str(), config.server.rpc_port))?
    .run();

    tokio::try_join!(rest, rpc)?;
    Ok(())
}

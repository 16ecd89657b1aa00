pub mod auth;
pub mod health;
pub mod rpc;
pub mod tasks;

use actix_web::{error, web};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// REST surface of the auth service.
///
/// Expects `web::Data<dyn UserRepository>` and `web::Data<TokenIssuer>`.
pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(auth::register)
        .service(auth::login)
        .service(auth::refresh);
}

/// Remote-procedure surface of the auth service. Same app data as `auth_config`.
pub fn rpc_config(cfg: &mut web::ServiceConfig) {
    cfg.service(rpc::dispatch);
}

/// REST surface of the task service; every route requires a bearer token.
///
/// Expects `web::Data<dyn TaskRepository>` and `web::Data<JwtKeys>`.
pub fn task_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .app_data(json_config())
            .app_data(path_config())
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Malformed or incomplete JSON bodies become `400 {"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            other => format!("Invalid request body: {}", other),
        };
        AppError::BadRequest(message).into()
    })
}

/// Non-numeric path ids become `400 {"error": "Invalid task ID"}`.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::BadRequest("Invalid task ID".into()).into())
}

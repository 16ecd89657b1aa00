use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Name reported by `/health`; each binary registers its own.
#[derive(Debug, Clone, Copy)]
pub struct ServiceName(pub &'static str);

/// Health check endpoint
///
/// Returns the service name, status and current timestamp.
#[get("/health")]
pub async fn health(service: Option<web::Data<ServiceName>>) -> impl Responder {
    let name = service.map(|s| s.0).unwrap_or("task-manager");
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": name,
        "timestamp": Utc::now()
    }))
}

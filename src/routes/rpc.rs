use actix_web::{post, web, HttpResponse};

use crate::{auth::TokenIssuer, repository::UserRepository, rpc};

/// JSON-RPC 2.0 endpoint (`ValidateToken`, `RefreshToken`).
///
/// Always answers `200 OK`; failures are carried in the JSON-RPC `error` member.
#[post("/rpc")]
pub async fn dispatch(
    users: web::Data<dyn UserRepository>,
    issuer: web::Data<TokenIssuer>,
    body: web::Bytes,
) -> HttpResponse {
    let response = rpc::handle(&body, users.get_ref(), issuer.get_ref()).await;
    HttpResponse::Ok().json(response)
}

#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test, web, App,
};
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;
use task_manager::{
    auth::{JwtKeys, TokenIssuer, TokenPair},
    models::UserId,
    repository::{MemoryTaskRepository, MemoryUserRepository, TaskRepository, UserRepository},
    routes::{self, health},
};

pub const SECRET: &str = "integration_test_secret";

/// Shared app data backed by in-memory repositories.
#[derive(Clone)]
pub struct TestState {
    pub users: web::Data<dyn UserRepository>,
    pub tasks: web::Data<dyn TaskRepository>,
    pub issuer: web::Data<TokenIssuer>,
    pub keys: web::Data<JwtKeys>,
}

impl TestState {
    pub fn new() -> Self {
        let keys = JwtKeys::new(SECRET);
        Self {
            users: web::Data::from(Arc::new(MemoryUserRepository::new()) as Arc<dyn UserRepository>),
            tasks: web::Data::from(Arc::new(MemoryTaskRepository::new()) as Arc<dyn TaskRepository>),
            issuer: web::Data::new(TokenIssuer::new(
                keys.clone(),
                Duration::minutes(15),
                Duration::hours(24),
            )),
            keys: web::Data::new(keys),
        }
    }

    /// Mints an access token without going through registration.
    pub fn token_for(&self, user_id: UserId) -> String {
        self.keys.generate_token(user_id, Duration::minutes(15)).unwrap()
    }

    pub fn expired_token_for(&self, user_id: UserId) -> String {
        self.keys.generate_token(user_id, Duration::minutes(-5)).unwrap()
    }
}

/// Both services' routes mounted on one app.
pub async fn init_app(
    state: &TestState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state.users.clone())
            .app_data(state.tasks.clone())
            .app_data(state.issuer.clone())
            .app_data(state.keys.clone())
            .service(health::health)
            .configure(routes::auth_config)
            .configure(routes::rpc_config)
            .configure(routes::task_config),
    )
    .await
}

/// Calls the app and returns status plus JSON body (`Null` when empty).
///
/// Errors raised by middleware are rendered the way the HTTP server would.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, parse_body(&body))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, parse_body(&body))
        }
    }
}

fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

/// Registers and logs in, returning the user id and both tokens.
pub async fn register_and_login<S, B>(app: &S, username: &str, password: &str) -> (UserId, TokenPair)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = register(app, username, password).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    let user_id = body["user_id"].as_i64().expect("user_id in registration response");

    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    let tokens: TokenPair = serde_json::from_value(body).expect("token pair in login response");

    (user_id, tokens)
}

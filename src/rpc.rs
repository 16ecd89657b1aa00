//! JSON-RPC 2.0 interface of the auth service for service-to-service calls.
//!
//! Two methods are exposed:
//!
//! - `ValidateToken` `{"access_token": "..."}` → `{"valid": true, "user_id": "42"}`
//!   or `{"valid": false}`. A bad token is a normal result, not an error.
//! - `RefreshToken` `{"refresh_token": "..."}` → `{"access_token", "refresh_token"}`.
//!   Unlike `POST /refresh`, this issues and stores a new refresh token as well.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{JwtKeys, TokenIssuer, TokenPair};
use crate::error::AppError;
use crate::repository::UserRepository;
use crate::routes::auth::user_for_refresh_token;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// Application-defined: the refresh token is unknown, superseded or expired.
pub const INVALID_REFRESH_TOKEN: i64 = -32001;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateTokenParams {
    pub access_token: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateTokenResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenParams {
    pub refresh_token: String,
}

/// Checks an access token with the same rules as the task service middleware.
pub fn validate_token(keys: &JwtKeys, params: &ValidateTokenParams) -> ValidateTokenResult {
    match keys.user_id_from_token(&params.access_token) {
        Ok(user_id) => ValidateTokenResult {
            valid: true,
            user_id: Some(user_id.to_string()),
        },
        Err(e) => {
            log::debug!("ValidateToken rejected a token: {}", e);
            ValidateTokenResult {
                valid: false,
                user_id: None,
            }
        }
    }
}

/// Exchanges a stored refresh token for a new access/refresh pair and stores the new refresh token.
pub async fn refresh_token(
    users: &dyn UserRepository,
    issuer: &TokenIssuer,
    params: &RefreshTokenParams,
) -> Result<TokenPair, RpcError> {
    let user = user_for_refresh_token(users, issuer, &params.refresh_token)
        .await
        .map_err(internal)?
        .ok_or_else(|| RpcError::new(INVALID_REFRESH_TOKEN, "Invalid refresh token"))?;

    let tokens = TokenPair {
        access_token: issuer.access_token(user.id).map_err(internal)?,
        refresh_token: issuer.refresh_token(user.id).map_err(internal)?,
    };
    users
        .save_refresh_token(user.id, &tokens.refresh_token)
        .await
        .map_err(internal)?;

    Ok(tokens)
}

/// Decodes one JSON-RPC request from `body`, runs it and builds the reply.
pub async fn handle(body: &[u8], users: &dyn UserRepository, issuer: &TokenIssuer) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_slice::<Value>(body) {
        Err(e) => return RpcResponse::failure(Value::Null, RpcError::new(PARSE_ERROR, e.to_string())),
        Ok(value) => match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return RpcResponse::failure(
                    Value::Null,
                    RpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
                )
            }
        },
    };

    let id = request.id.clone().unwrap_or(Value::Null);
    if request.jsonrpc.as_deref().is_some_and(|version| version != "2.0") {
        return RpcResponse::failure(
            id,
            RpcError::new(INVALID_REQUEST, "Unsupported jsonrpc version"),
        );
    }

    let outcome = match request.method.as_str() {
        "ValidateToken" => params::<ValidateTokenParams>(request.params)
            .map(|p| validate_token(issuer.keys(), &p))
            .and_then(to_value),
        "RefreshToken" => match params::<RefreshTokenParams>(request.params) {
            Ok(p) => refresh_token(users, issuer, &p).await.and_then(to_value),
            Err(e) => Err(e),
        },
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    };

    match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(error) => {
            log::warn!("rpc {} failed: {} ({})", request.method, error.message, error.code);
            RpcResponse::failure(id, error)
        }
    }
}

fn params<T: serde::de::DeserializeOwned>(raw: Option<Value>) -> Result<T, RpcError> {
    serde_json::from_value(raw.unwrap_or(Value::Null))
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e)))
}

fn to_value<T: Serialize>(result: T) -> Result<Value, RpcError> {
    serde_json::to_value(result).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}

fn internal(error: AppError) -> RpcError {
    log::error!("rpc internal error: {}", error);
    RpcError::new(INTERNAL_ERROR, "Internal error")
}

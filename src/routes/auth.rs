use crate::{
    auth::{
        hash_password, token::parse_subject, verify_password, verify_unknown_user,
        AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse,
        TokenIssuer, TokenPair,
    },
    error::AppError,
    models::User,
    repository::UserRepository,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Body of every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
/// Body of every failed refresh, whatever the cause.
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// Register a new user
///
/// Hashes the password and stores the account. Any persistence failure,
/// including a taken username, is reported with the same generic 500.
///
/// ## Responses:
/// - `201 Created`: `{"message": "User created", "user_id": <id>}`.
/// - `400 Bad Request`: malformed body or failed validation.
/// - `500 Internal Server Error`: `{"error": "Failed to create user"}`.
#[post("/register")]
pub async fn register(
    users: web::Data<dyn UserRepository>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let password_hash = hash_password(&register_data.password)?;

    let user = users
        .create_user(&register_data.username, &password_hash)
        .await
        .map_err(|e| {
            log::warn!("failed to create user {:?}: {}", register_data.username, e);
            AppError::InternalServerError("Failed to create user".into())
        })?;

    log::info!("registered user {} ({})", user.id, user.username);

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User created".to_string(),
        user_id: user.id,
    }))
}

/// Login user
///
/// Verifies the credentials, issues an access and a refresh token, and stores
/// the refresh token as the user's single active one. Unknown usernames and
/// wrong passwords produce the identical 401 body, and both pay for a bcrypt
/// verification.
#[post("/login")]
pub async fn login(
    users: web::Data<dyn UserRepository>,
    issuer: web::Data<TokenIssuer>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = users.find_by_username(&login_data.username).await?;
    let user = match user {
        Some(user) if password_matches(&login_data.password, &user) => user,
        found => {
            if found.is_none() {
                verify_unknown_user(&login_data.password);
            }
            log::warn!("failed login for {:?}", login_data.username);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    let tokens = TokenPair {
        access_token: issuer.access_token(user.id)?,
        refresh_token: issuer.refresh_token(user.id)?,
    };
    users.save_refresh_token(user.id, &tokens.refresh_token).await?;

    log::info!("user {} logged in", user.id);
    Ok(HttpResponse::Ok().json(tokens))
}

/// Refresh an access token
///
/// The refresh token must still verify and must be the one stored for its
/// subject. Returns a fresh access token; the refresh token is left as is.
#[post("/refresh")]
pub async fn refresh(
    users: web::Data<dyn UserRepository>,
    issuer: web::Data<TokenIssuer>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let user = user_for_refresh_token(users.get_ref(), issuer.get_ref(), &refresh_data.refresh_token)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()))?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token: issuer.access_token(user.id)?,
    }))
}

/// Resolves the owner of a stored refresh token.
///
/// `Ok(None)` covers every rejection: bad signature, expiry, no matching row,
/// or a row whose id differs from the token subject.
pub async fn user_for_refresh_token(
    users: &dyn UserRepository,
    issuer: &TokenIssuer,
    refresh_token: &str,
) -> Result<Option<User>, AppError> {
    let subject = match issuer
        .keys()
        .verify_token(refresh_token)
        .and_then(|claims| parse_subject(&claims.sub))
    {
        Ok(subject) => subject,
        Err(e) => {
            log::warn!("refresh token rejected: {}", e);
            return Ok(None);
        }
    };

    let user = users.find_by_refresh_token(refresh_token).await?;
    Ok(user.filter(|user| user.id == subject))
}

fn password_matches(password: &str, user: &User) -> bool {
    match verify_password(password, &user.password_hash) {
        Ok(matches) => matches,
        Err(e) => {
            log::error!("stored hash for user {} is unusable: {}", user.id, e);
            false
        }
    }
}

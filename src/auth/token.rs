use crate::error::AppError;
use crate::models::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The only claims carried by access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the stringified numeric user id.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// HS256 signing and verification keys derived from the shared secret.
///
/// Both services build one of these from `JWT_SECRET`; the task service only
/// ever verifies.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signs a token for `user_id` that expires `ttl` from now.
    pub fn generate_token(&self, user_id: UserId, ttl: Duration) -> Result<String, AppError> {
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            log::error!("token lifetime {} is out of range", ttl);
            AppError::InternalServerError("Failed to generate token".into())
        })?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            log::error!("failed to sign token: {}", e);
            AppError::InternalServerError("Failed to generate token".into())
        })
    }

    /// Checks signature, algorithm and expiry, returning the decoded claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Verifies `token` and parses its subject as a user id.
    pub fn user_id_from_token(&self, token: &str) -> Result<UserId, AppError> {
        let claims = self.verify_token(token)?;
        parse_subject(&claims.sub)
    }
}

/// The subject must be a plain decimal integer that fits the id column.
pub fn parse_subject(sub: &str) -> Result<UserId, AppError> {
    Some(sub)
        .filter(|sub| sub.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|sub| sub.parse::<u64>().ok())
        .and_then(|id| UserId::try_from(id).ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid token subject".into()))
}

/// Extracts the raw token from an `Authorization` header value.
///
/// The value must split on whitespace into exactly `Bearer` and the token.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthorized("Authorization header is required".into()))?;

    let parts: Vec<&str> = header.split_whitespace().collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(AppError::Unauthorized(
            "Expected authorization header format: Bearer <token>".into(),
        )),
    }
}

/// Issues the access/refresh pair with the configured lifetimes.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: JwtKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: JwtKeys, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            keys,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn access_token(&self, user_id: UserId) -> Result<String, AppError> {
        self.keys.generate_token(user_id, self.access_ttl)
    }

    pub fn refresh_token(&self, user_id: UserId) -> Result<String, AppError> {
        self.keys.generate_token(user_id, self.refresh_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_for_tokens";

    #[test]
    fn test_token_generation_and_verification() {
        let keys = JwtKeys::new(SECRET);
        let token = keys.generate_token(1, Duration::minutes(15)).unwrap();

        let claims = keys.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "1");
        assert!(claims.exp > Utc::now().timestamp());
        assert_eq!(keys.user_id_from_token(&token).unwrap(), 1);
    }

    #[test]
    fn test_token_expiration() {
        let keys = JwtKeys::new(SECRET);
        let expired_token = keys.generate_token(2, Duration::hours(-2)).unwrap();

        match keys.verify_token(&expired_token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has expired"),
            Ok(_) => panic!("Token should have been invalid due to expiration"),
            Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = JwtKeys::new("some_other_secret")
            .generate_token(3, Duration::minutes(5))
            .unwrap();

        match JwtKeys::new(SECRET).verify_token(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("Token should have been rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_other_algorithm() {
        let claims = Claims {
            sub: "4".to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(JwtKeys::new(SECRET).verify_token(&token).is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "john_doe".to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let keys = JwtKeys::new(SECRET);
        assert!(keys.verify_token(&token).is_ok());
        assert!(matches!(
            keys.user_id_from_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_parse_subject() {
        assert_eq!(parse_subject("42").unwrap(), 42);
        assert!(parse_subject("-1").is_err());
        assert!(parse_subject("").is_err());
        assert!(parse_subject("18446744073709551615").is_err());
        assert!(parse_subject("+5").is_err());
        assert!(parse_subject(" 5").is_err());
        assert_eq!(parse_subject("007").unwrap(), 7);
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let keys = JwtKeys::new(SECRET);
        let issuer = TokenIssuer::new(keys.clone(), Duration::days(200_000_000), Duration::hours(24));

        assert!(matches!(
            issuer.access_token(1),
            Err(AppError::InternalServerError(_))
        ));
        assert!(matches!(
            keys.generate_token(1, Duration::days(-200_000_000)),
            Err(AppError::InternalServerError(_))
        ));
        assert!(issuer.refresh_token(1).is_ok());
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(parse_bearer(Some("Bearer   abc")).unwrap(), "abc");

        for bad in ["", "Bearer", "bearer abc", "Basic abc", "Bearer a b", "abc"] {
            assert!(
                matches!(parse_bearer(Some(bad)), Err(AppError::Unauthorized(_))),
                "header {:?} should be rejected",
                bad
            );
        }
        assert!(matches!(parse_bearer(None), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_issuer_lifetimes() {
        let issuer = TokenIssuer::new(JwtKeys::new(SECRET), Duration::minutes(15), Duration::hours(24));

        let access = issuer.keys().verify_token(&issuer.access_token(9).unwrap()).unwrap();
        let refresh = issuer.keys().verify_token(&issuer.refresh_token(9).unwrap()).unwrap();

        assert_eq!(access.sub, "9");
        assert_eq!(refresh.sub, "9");
        assert!(refresh.exp - access.exp >= Duration::hours(23).num_seconds());
    }
}

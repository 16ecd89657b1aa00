//! Environment-driven configuration shared by both services.
//!
//! Values are read from the process environment after loading an optional
//! `.env` file. `Config::from_lookup` holds the actual parsing so it can be
//! exercised without mutating the environment.

use chrono::Duration;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::fmt;

const DEFAULT_ACCESS_TOKEN_EXPIRY: &str = "15m";
const DEFAULT_REFRESH_TOKEN_EXPIRY: &str = "24h";
/// Upper bound for any configured duration: ten years.
const MAX_DURATION_SECONDS: i64 = 60 * 60 * 24 * 3650;

/// Error raised while reading configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// A variable is present but could not be parsed.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection string; when set it wins over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: Duration,
    pub refresh_token_expiry: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub auth_port: u16,
    pub task_port: u16,
    pub rpc_port: u16,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database = DatabaseConfig {
            url: get("DATABASE_URL"),
            host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(get("DB_PORT"), "DB_PORT", 5432)?,
            user: get("DB_USER").unwrap_or_else(|| "postgres".to_string()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: get("DB_NAME").unwrap_or_else(|| "task_manager".to_string()),
            max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            access_token_expiry: duration_or(
                get("ACCESS_TOKEN_EXPIRY"),
                "ACCESS_TOKEN_EXPIRY",
                DEFAULT_ACCESS_TOKEN_EXPIRY,
            )?,
            refresh_token_expiry: duration_or(
                get("REFRESH_TOKEN_EXPIRY"),
                "REFRESH_TOKEN_EXPIRY",
                DEFAULT_REFRESH_TOKEN_EXPIRY,
            )?,
        };

        let server = ServerConfig {
            host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            auth_port: parse_or(get("AUTH_PORT"), "AUTH_PORT", 8080)?,
            task_port: parse_or(get("TASK_PORT"), "TASK_PORT", 8081)?,
            rpc_port: match get("RPC_PORT") {
                Some(raw) => parse_or(Some(raw), "RPC_PORT", 50051)?,
                None => parse_or(get("GRPC_PORT"), "GRPC_PORT", 50051)?,
            },
        };

        Ok(Self {
            database,
            jwt,
            server,
        })
    }
}

impl DatabaseConfig {
    /// Connection options for the pool.
    ///
    /// `DATABASE_URL` is parsed as-is; otherwise the parts are passed through
    /// unencoded, so passwords may contain any character.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.url {
            Some(url) => url.parse(),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.name)),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn duration_or(
    value: Option<String>,
    key: &'static str,
    default: &str,
) -> Result<Duration, ConfigError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    parse_duration(&raw).ok_or(ConfigError::Invalid { key, value: raw })
}

/// Parses `90`, `45s`, `15m`, `24h`, `7d` or compounds such as `1h30m`.
/// A bare number is taken as seconds. Results must be positive and at most
/// ten years.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let seconds = match raw.parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => unit_seconds(raw)?,
    };
    if !(1..=MAX_DURATION_SECONDS).contains(&seconds) {
        return None;
    }
    Duration::try_seconds(seconds)
}

fn unit_seconds(raw: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let amount: i64 = digits.parse().ok()?;
        digits.clear();
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 60 * 60 * 24,
            _ => return None,
        };
        total = total.checked_add(amount.checked_mul(unit)?)?;
    }
    // trailing digits without a unit
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

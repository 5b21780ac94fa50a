/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::services::auth::VerificationKey;
use crate::services::id_codec::{DEFAULT_ALPHABET, DEFAULT_MIN_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How bearer tokens are verified.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub algorithm: Algorithm,
    pub key: VerificationKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

/// Transport-level limits applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub body_limit_bytes: usize,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: 1024 * 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // None = in-memory store (development only)
    pub database_url: Option<String>,

    pub sqids_min_length: usize,
    pub sqids_alphabet: String,

    pub auth: AuthConfig,
    pub http: HttpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source (the environment in production).
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match non_empty("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let database_url = non_empty("DATABASE_URL");
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let sqids_min_length = non_empty("SQIDS_MIN_LENGTH")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MIN_LENGTH);

        let sqids_alphabet =
            non_empty("SQIDS_ALPHABET").unwrap_or_else(|| DEFAULT_ALPHABET.to_string());

        let algorithm = match non_empty("AUTH_JWT_ALGORITHM") {
            Some(v) => Algorithm::from_str(v.trim())
                .map_err(|_| ConfigError::Invalid("AUTH_JWT_ALGORITHM"))?,
            // identity providers (Clerk, Auth0, ...) sign session tokens with RS256
            None => Algorithm::RS256,
        };

        let key = if matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            VerificationKey::Secret(
                non_empty("AUTH_JWT_SECRET").ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?,
            )
        } else {
            VerificationKey::PublicKeyPem(
                non_empty("AUTH_JWT_PUBLIC_KEY_PEM")
                    .ok_or(ConfigError::Missing("AUTH_JWT_PUBLIC_KEY_PEM"))?
                    .replace("\\n", "\n"),
            )
        };

        let leeway_seconds = non_empty("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let auth = AuthConfig {
            algorithm,
            key,
            issuer: non_empty("AUTH_ISSUER"),
            audience: non_empty("AUTH_AUDIENCE"),
            leeway_seconds,
        };

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            body_limit_bytes: non_empty("REQUEST_BODY_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.body_limit_bytes),
            timeout: non_empty("REQUEST_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            database_url,
            sqids_min_length,
            sqids_alphabet,
            auth,
            http,
        })
    }
}

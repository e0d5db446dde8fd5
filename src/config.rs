/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, CORS 許可, DATABASE_URL, Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::auth::AuthSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
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

/// Bearer-token gate settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub domain: String,
    pub audience: String,
    pub issuer: String,
    pub jwks_url: Url,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,

    pub jwks_fetch_timeout: Duration,
    // Zero disables caching
    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh: Duration,
}

impl AuthConfig {
    /// Defaults for an issuer living at `https://{domain}/`.
    pub fn for_domain(domain: &str, audience: &str) -> Result<Self, ConfigError> {
        let domain = domain.trim().trim_end_matches('/').to_string();
        let issuer = format!("https://{domain}/");
        let jwks_url = Url::parse(&issuer)
            .and_then(|base| base.join(".well-known/jwks.json"))
            .map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))?;

        Ok(Self {
            domain,
            audience: audience.trim().to_string(),
            issuer,
            jwks_url,
            algorithms: vec![Algorithm::RS256],
            leeway_seconds: 0,
            jwks_fetch_timeout: Duration::from_secs(5),
            jwks_cache_ttl: Duration::from_secs(300),
            jwks_min_refresh: Duration::from_secs(5),
        })
    }

    pub fn settings(&self) -> AuthSettings {
        AuthSettings {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            algorithms: self.algorithms.clone(),
            leeway_seconds: self.leeway_seconds,
        }
    }

    fn from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let domain = var("AUTH_DOMAIN")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("AUTH_DOMAIN"))?;
        let audience = var("AUTH_AUDIENCE")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let mut auth = Self::for_domain(&domain, &audience)?;

        if let Some(issuer) = var("AUTH_ISSUER") {
            auth.issuer = issuer;
        }

        if let Some(raw) = var("AUTH_JWKS_URL") {
            auth.jwks_url = Url::parse(&raw).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?;
        }

        if let Some(raw) = var("AUTH_ALGORITHMS") {
            auth.algorithms =
                parse_algorithms(&raw).ok_or(ConfigError::Invalid("AUTH_ALGORITHMS"))?;
        }

        if let Some(v) = parse_u64(var, "ACCESS_TOKEN_LEEWAY_SECONDS")? {
            auth.leeway_seconds = v;
        }
        if let Some(v) = parse_u64(var, "JWKS_FETCH_TIMEOUT_SECONDS")? {
            if v == 0 {
                return Err(ConfigError::Invalid("JWKS_FETCH_TIMEOUT_SECONDS"));
            }
            auth.jwks_fetch_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_u64(var, "JWKS_CACHE_TTL_SECONDS")? {
            auth.jwks_cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = parse_u64(var, "JWKS_MIN_REFRESH_SECONDS")? {
            auth.jwks_min_refresh = Duration::from_secs(v);
        }

        Ok(auth)
    }
}

/// Comma-separated algorithm names. Shared-secret (HS*) algorithms are refused:
/// the key set only carries public keys.
fn parse_algorithms(raw: &str) -> Option<Vec<Algorithm>> {
    let mut algorithms = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name).ok()?;
        if matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return None;
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    (!algorithms.is_empty()).then_some(algorithms)
}

fn parse_u64(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    var(key)
        .map(|v| v.trim().parse::<u64>().map_err(|_| ConfigError::Invalid(key)))
        .transpose()
}

pub struct Config {
    pub addr: SocketAddr,
    // Unset: in-memory store
    pub database_url: Option<String>,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = var("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth = AuthConfig::from_vars(&var)?;

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth,
        })
    }
}

use std::{fmt, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Duration;
use platform_authn::AdminCredentials;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;

#[derive(Clone)]
pub struct AppConfig {
    pub admin: AdminCredentials,
    pub cookie_key: Key,
    pub cookie_secure: bool,
    pub session_ttl: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub public_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let defaults = AdminCredentials::default();
        let admin = AdminCredentials {
            email: std::env::var("ADMIN_EMAIL").unwrap_or(defaults.email),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.password),
        };

        let cookie_key = match std::env::var("COOKIE_SECRET_BASE64") {
            Ok(secret) => decode_cookie_key(&secret)?,
            Err(_) => {
                tracing::warn!(
                    "COOKIE_SECRET_BASE64 not set; sessions will not survive a restart"
                );
                Key::generate()
            }
        };

        let session_ttl_minutes = match std::env::var("SESSION_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| anyhow!("SESSION_TTL_MINUTES must be a positive integer"))?,
            Err(_) => DEFAULT_SESSION_TTL_MINUTES,
        };

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let public_dir = std::env::var("PUBLIC_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            admin,
            cookie_key,
            cookie_secure: env_bool("COOKIE_SECURE", false),
            session_ttl: Duration::minutes(session_ttl_minutes),
            cors_allowed_origins,
            public_dir,
        })
    }

    /// Default credentials, a throwaway cookie key and no static mount.
    pub fn ephemeral() -> Self {
        Self {
            admin: AdminCredentials::default(),
            cookie_key: Key::generate(),
            cookie_secure: false,
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            cors_allowed_origins: Vec::new(),
            public_dir: None,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("admin", &self.admin)
            .field("cookie_key", &"<redacted>")
            .field("cookie_secure", &self.cookie_secure)
            .field("session_ttl", &self.session_ttl)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("public_dir", &self.public_dir)
            .finish()
    }
}

fn decode_cookie_key(secret: &str) -> Result<Key> {
    let bytes = STANDARD
        .decode(secret.trim())
        .context("invalid COOKIE_SECRET_BASE64")?;
    Key::try_from(bytes.as_slice())
        .map_err(|_| anyhow!("COOKIE_SECRET_BASE64 must decode to at least 64 bytes"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn env_bool(var: &str, default: bool) -> bool {
    std::env::var(var)
        .ok()
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

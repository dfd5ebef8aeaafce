use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Model identity and credentials, resolved once at startup.
#[derive(Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutrimind".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutrimind-users".into()),
            ttl_minutes: parse_env("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parse_env("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into()),
            timeout_secs: parse_env("GEMINI_TIMEOUT_SECS").unwrap_or(30),
        };
        Ok(Self {
            database_url,
            jwt,
            gemini,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_debug_hides_api_key() {
        let cfg = GeminiConfig {
            api_key: "super-secret".into(),
            model: DEFAULT_GEMINI_MODEL.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.into(),
            timeout_secs: 30,
        };
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains(DEFAULT_GEMINI_MODEL));
    }

    #[test]
    fn parse_env_ignores_garbage() {
        std::env::set_var("NUTRIMIND_TEST_PARSE_ENV", "not-a-number");
        assert_eq!(parse_env::<u64>("NUTRIMIND_TEST_PARSE_ENV"), None);
        std::env::set_var("NUTRIMIND_TEST_PARSE_ENV", "42");
        assert_eq!(parse_env::<u64>("NUTRIMIND_TEST_PARSE_ENV"), Some(42));
        std::env::remove_var("NUTRIMIND_TEST_PARSE_ENV");
    }
}

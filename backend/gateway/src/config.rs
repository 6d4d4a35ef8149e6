//! Application configuration loaded from environment variables.

use chrono::Duration;

use crate::errors::{GatewayError, Result};

/// Longest accepted intro period (one year).
pub const MAX_INTRO_PERIOD_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL (e.g. sqlite:./vibetrip.db)
    pub database_url: String,
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub jwt_ttl_secs: u64,
    /// Port for the REST API server (`API_PORT`, falling back to `PORT`)
    pub api_port: u16,
    /// Browser origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Cooling-off window between joining a chat and paying
    pub intro_period: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Split out so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::Config("JWT_SECRET environment variable is required".to_string())
            })?;

        let intro_period = parse_intro_period(&var("INTRO_PERIOD_SECS", "86400"))?;

        let api_port = lookup("API_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| GatewayError::Config("Invalid API_PORT".to_string()))?;

        Ok(Config {
            database_url: var("DATABASE_URL", "sqlite:./vibetrip.db"),
            jwt_secret,
            jwt_ttl_secs: parse_duration_secs(&var("JWT_EXPIRES_IN", "7d"))
                .ok_or_else(|| GatewayError::Config("Invalid JWT_EXPIRES_IN".to_string()))?,
            api_port,
            allowed_origins: parse_origins(&var("CLIENT_ORIGIN", "http://localhost:5173")),
            intro_period,
        })
    }
}

/// Intro period in whole seconds, within `1..=MAX_INTRO_PERIOD_SECS`.
fn parse_intro_period(raw: &str) -> Result<Duration> {
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|_| GatewayError::Config("Invalid INTRO_PERIOD_SECS".to_string()))?;
    if !(1..=MAX_INTRO_PERIOD_SECS).contains(&secs) {
        return Err(GatewayError::Config(format!(
            "INTRO_PERIOD_SECS must be between 1 and {MAX_INTRO_PERIOD_SECS}"
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| GatewayError::Config("INTRO_PERIOD_SECS out of range".to_string()))
}

/// Parse `90`, `45s`, `30m`, `12h` or `7d` into seconds. Zero is rejected.
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&raw[..i], c),
        _ => (raw, 's'),
    };
    let value: u64 = digits.trim().parse().ok()?;
    let multiplier = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return None,
    };
    value.checked_mul(multiplier).filter(|secs| *secs > 0)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

/// Every stored question carries exactly this many options (A-D).
pub const OPTION_COUNT: usize = 4;

/// Tab switches tolerated before an attempt is forced to a zero score.
pub const MAX_INTEGRITY_VIOLATIONS: u32 = 3;

/// Interval between sweeps of idle attempts.
pub const ATTEMPT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When absent the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub cors_origin: String,
    /// Executable that turns uploaded material into questions.
    pub generator_command: String,
    pub generator_args: Vec<String>,
    /// A generator run longer than this is killed and the upload fails.
    pub generator_timeout_secs: u64,
    /// Attempts idle for longer than this are dropped without a record.
    pub attempt_retention_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let generator_command =
            env::var("GENERATOR_COMMAND").unwrap_or_else(|_| "python3".to_string());
        let generator_args = env::var("GENERATOR_ARGS")
            .unwrap_or_else(|_| "python/generate_questions.py".to_string())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86_400)?,
            rust_log,
            port: parse_var("PORT", 3000)?,
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            generator_command,
            generator_args,
            generator_timeout_secs: parse_var("GENERATOR_TIMEOUT_SECS", 120)?,
            attempt_retention_secs: parse_var("ATTEMPT_RETENTION_SECS", 7_200)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

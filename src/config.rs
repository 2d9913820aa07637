// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;

/// Passing threshold used when an assessment does not set its own.
pub const DEFAULT_PASSING_SCORE: i32 = 60;

/// How many jobs the recommendation endpoint scores per request.
pub const RECOMMENDATION_POOL_SIZE: i64 = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub default_passing_score: i32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let default_passing_score = env::var("DEFAULT_PASSING_SCORE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|score| (0..=100).contains(score))
            .unwrap_or(DEFAULT_PASSING_SCORE);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            admin_username: env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            default_passing_score,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_list_skips_blanks() {
        assert_eq!(
            parse_list("http://a.test, ,http://b.test ,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}

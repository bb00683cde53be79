use std::path::PathBuf;

use chrono::Duration;

/// A valid-but-worthless key so local development works out of the box.
/// Refused outright in production.
const INSECURE_DEV_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// 64 hex chars; keys the login-secret hash and session signatures.
    pub secret_key: String,
    /// Validity window for issued login tokens, in seconds.
    /// Set via GATEHOUSE_LOGIN_TTL. Default: 30.
    pub login_ttl_secs: u64,
    /// Session cookie lifetime, in seconds. Default: 172800 (48h).
    pub session_ttl_secs: u64,
    /// Where a successful login redirects to.
    pub landing_url: String,
    /// Enables the request profiler when set.
    pub profile_key: Option<String>,
    pub profile_dir: PathBuf,
}

impl Config {
    pub fn login_ttl(&self) -> Duration {
        Duration::seconds(self.login_ttl_secs as i64)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs as i64)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let secret_key =
        std::env::var("GATEHOUSE_SECRET_KEY").unwrap_or_else(|_| INSECURE_DEV_KEY.into());

    if secret_key == INSECURE_DEV_KEY {
        let env_mode = std::env::var("GATEHOUSE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "GATEHOUSE_SECRET_KEY is still the insecure placeholder. \
                 Set a proper 64-char hex key before running in production."
            );
        }
        eprintln!("⚠️  GATEHOUSE_SECRET_KEY is not set — using insecure placeholder. Set a 64-char hex key for production.");
    }

    Ok(Config {
        port: std::env::var("GATEHOUSE_PORT")
            .unwrap_or_else(|_| "8443".into())
            .parse()
            .unwrap_or(8443),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/gatehouse".into()),
        redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        secret_key,
        login_ttl_secs: std::env::var("GATEHOUSE_LOGIN_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        session_ttl_secs: std::env::var("GATEHOUSE_SESSION_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(172_800),
        landing_url: std::env::var("GATEHOUSE_LANDING_URL").unwrap_or_else(|_| "/admin/".into()),
        profile_key: std::env::var("GATEHOUSE_PROFILE_KEY").ok(),
        profile_dir: std::env::var("GATEHOUSE_PROFILE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/var/lib/gatehouse/profiles")),
    })
}

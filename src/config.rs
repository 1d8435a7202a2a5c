//! Runtime configuration.
//!
//! Every option can come from a flag or from the environment (`.env` files are
//! loaded first). Parsed once at startup.

use crate::auth::SigningKey;
use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

/// Five hours.
pub const DEFAULT_TTL_SECS: u64 = 5 * 60 * 60;
/// One year.
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Parser, Debug, Clone)]
#[command(name = "storefront")]
#[command(about = "Storefront backend - catalog API behind stateless bearer-token auth")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "STOREFRONT_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// HMAC secret for signing tokens (random per process if unset)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, env = "JWT_TTL_SECS", default_value_t = DEFAULT_TTL_SECS)]
    pub jwt_ttl_secs: u64,

    /// Provisioned account name
    #[arg(long, env = "AUTH_USERNAME", default_value = "elisha")]
    pub username: String,

    /// Provisioned account password
    #[arg(long, env = "AUTH_PASSWORD", default_value = "password", hide_env_values = true)]
    pub password: String,

    /// Roles of the provisioned account (comma-separated)
    #[arg(long, env = "AUTH_ROLES", default_value = "admin", value_delimiter = ',')]
    pub roles: Vec<String>,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// SQLite file for identities (in-memory when unset)
    #[arg(long, env = "AUTH_DB_PATH")]
    pub auth_db_path: Option<PathBuf>,
}

impl Config {
    /// Load `.env`, then parse flags and environment
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            bail!("AUTH_USERNAME must not be empty");
        }
        if self.jwt_ttl_secs == 0 {
            bail!("JWT_TTL_SECS must be positive");
        }
        if self.jwt_ttl_secs > MAX_TTL_SECS {
            bail!(
                "JWT_TTL_SECS must be at most {} (got {})",
                MAX_TTL_SECS,
                self.jwt_ttl_secs
            );
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31 (got {})", self.bcrypt_cost);
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Result<Duration> {
        i64::try_from(self.jwt_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .context("JWT_TTL_SECS is out of range")
    }

    /// Signing key from `JWT_SECRET`, or a random one with a warning
    pub fn signing_key(&self) -> Result<SigningKey> {
        match self.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => SigningKey::from_secret(secret),
            None => {
                warn!("⚠️  JWT_SECRET not set; using a random key. Tokens won't survive a restart.");
                Ok(SigningKey::generate())
            }
        }
    }

    pub fn roles(&self) -> Vec<String> {
        self.roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["storefront"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_parse() {
        let config = parse(&[
            "--addr",
            "127.0.0.1:9000",
            "--jwt-ttl-secs",
            "60",
            "--username",
            "alice",
            "--roles",
            "admin, buyer",
            "--bcrypt-cost",
            "4",
        ]);

        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.token_ttl().unwrap(), Duration::seconds(60));
        assert_eq!(config.username, "alice");
        assert_eq!(config.roles(), vec!["admin".to_string(), "buyer".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(parse(&["--jwt-ttl-secs", "0"]).validate().is_err());
        assert!(parse(&["--bcrypt-cost", "3"]).validate().is_err());
        assert!(parse(&["--username", " "]).validate().is_err());
        assert!(parse(&["--jwt-ttl-secs", "31536001"]).validate().is_err());
        assert!(parse(&["--jwt-ttl-secs", "31536000"]).validate().is_ok());
    }

    #[test]
    fn test_oversized_ttl_is_an_error_not_a_panic() {
        let config = parse(&["--jwt-ttl-secs", "100000000000000000"]);
        assert!(config.validate().is_err());
        assert!(config.token_ttl().is_err());
    }

    #[test]
    fn test_signing_key_from_secret() {
        let config = parse(&["--jwt-secret", "0123456789abcdef0123456789abcdef"]);
        assert!(config.signing_key().is_ok());

        let short = parse(&["--jwt-secret", "too-short"]);
        assert!(short.signing_key().is_err());
    }
}

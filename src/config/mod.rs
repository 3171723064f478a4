//! Configuration module for the MDM console.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default page size requested by list screens.
pub const DEFAULT_LIST_LIMIT: u32 = 500;

/// Default hours a stored session token is kept without being refreshed by a login.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST API (without the `/api/v1` prefix)
    pub api_url: String,
    /// Storage key name under which the bearer token is kept
    pub token_key: String,
    /// Path to the SQLite file backing the token store
    pub db_path: PathBuf,
    /// Address to bind the console to
    pub bind_addr: SocketAddr,
    /// Page size sent as `?limit=` on list screens
    pub list_limit: u32,
    /// Hours after which stored session tokens are pruned
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure` (console served over HTTPS)
    pub secure_cookies: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_url = env::var("MDM_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let token_key = env::var("MDM_TOKEN_KEY").unwrap_or_else(|_| "mdm_token".to_string());

        let db_path = env::var("MDM_DB_PATH")
            .unwrap_or_else(|_| "./data/console.sqlite".to_string())
            .into();

        let bind_addr = env::var("MDM_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid MDM_BIND_ADDR format: {}", e))?;

        let list_limit = match env::var("MDM_LIST_LIMIT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| format!("Invalid MDM_LIST_LIMIT value {:?}: {}", raw, e))?,
            Err(_) => DEFAULT_LIST_LIMIT,
        };

        let session_ttl_hours = match env::var("MDM_SESSION_TTL_HOURS") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| format!("Invalid MDM_SESSION_TTL_HOURS value {:?}: {}", raw, e))?,
            Err(_) => DEFAULT_SESSION_TTL_HOURS,
        };

        let secure_cookies = env::var("MDM_SECURE_COOKIES")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        let log_level = env::var("MDM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            api_url,
            token_key,
            db_path,
            bind_addr,
            list_limit,
            session_ttl_hours,
            secure_cookies,
            log_level,
        })
    }

    /// Maximum age of a stored session token.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("MDM_API_URL");
        env::remove_var("MDM_TOKEN_KEY");
        env::remove_var("MDM_DB_PATH");
        env::remove_var("MDM_BIND_ADDR");
        env::remove_var("MDM_LIST_LIMIT");
        env::remove_var("MDM_SESSION_TTL_HOURS");
        env::remove_var("MDM_SECURE_COOKIES");
        env::remove_var("MDM_LOG_LEVEL");

        let config = Config::from_env().unwrap();

        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.token_key, "mdm_token");
        assert_eq!(config.db_path, PathBuf::from("./data/console.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.list_limit, 500);
        assert_eq!(config.session_ttl_hours, 24);
        assert!(!config.secure_cookies);
        assert_eq!(config.session_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.log_level, "info");
    }
}

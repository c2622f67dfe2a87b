use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::rank::DEFAULT_MINVOTES;

#[derive(Clone, Serialize)]
pub struct Config {
    pub sqlite_path: String,
    /// Seconds between ingestion poll cycles.
    pub poll_secs: u64,
    /// Minimum votes before an actor can appear in rankings.
    pub minvotes: u64,
    pub cache_ttl_secs: u64,
    /// Fallback window for malformed window expressions.
    pub default_window: String,
    /// Max comments fetched per poll cycle.
    pub fetch_limit: u32,
    pub feed_base: String,
    pub feed_auth_base: String,
    pub user_agent: String,
    #[serde(skip_serializing)]
    pub feed_client_id: Option<String>,
    #[serde(skip_serializing)]
    pub feed_client_secret: Option<String>,
    #[serde(skip_serializing)]
    pub feed_username: Option<String>,
    #[serde(skip_serializing)]
    pub feed_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            sqlite_path: std::env::var("SQLITE_PATH").unwrap_or_else(|_| "./votes.db".to_string()),
            poll_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            minvotes: std::env::var("MINVOTES").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_MINVOTES),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            default_window: std::env::var("DEFAULT_WINDOW").unwrap_or_else(|_| "1y".to_string()),
            fetch_limit: std::env::var("FETCH_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(100),
            feed_base: std::env::var("FEED_BASE").unwrap_or_else(|_| "https://oauth.reddit.com".to_string()),
            feed_auth_base: std::env::var("FEED_AUTH_BASE").unwrap_or_else(|_| "https://www.reddit.com".to_string()),
            user_agent: std::env::var("USER_AGENT").unwrap_or_else(|_| "botranks/0.1".to_string()),
            feed_client_id: std::env::var("FEED_CLIENT_ID").ok(),
            feed_client_secret: std::env::var("FEED_CLIENT_SECRET").ok(),
            feed_username: std::env::var("FEED_USERNAME").ok(),
            feed_password: std::env::var("FEED_PASSWORD").ok(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// SHA-256 over the serialized config (credentials excluded), for run
    /// manifests and log correlation.
    pub fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_env();
        assert_eq!(cfg.minvotes, 3);
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.default_window, "1y");
    }

    #[test]
    fn test_config_hash_deterministic() {
        let cfg = Config::from_env();
        assert_eq!(cfg.config_hash(), cfg.config_hash());
        assert_eq!(cfg.config_hash().len(), 64);
    }

    #[test]
    fn test_credentials_not_serialized() {
        let mut cfg = Config::from_env();
        cfg.feed_password = Some("hunter2".to_string());
        assert!(!cfg.to_json().contains("hunter2"));
    }
}

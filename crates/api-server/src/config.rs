use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_COINGECKO_TIMEOUT_SECS: u64 = 30;

/// Server settings read from the environment (after `.env` is loaded).
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// HMAC secret for signing bearer tokens
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// JSON file backing the watchlist store
    pub watchlist_path: PathBuf,
    pub coingecko_base_url: String,
    pub coingecko_timeout_secs: u64,
    pub enable_hsts: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => bail!("JWT_SECRET must be set"),
        };

        let port = match get("PORT") {
            Some(v) => v.parse().with_context(|| format!("Invalid PORT: {}", v))?,
            None => DEFAULT_PORT,
        };

        let token_ttl_secs = match get("TOKEN_TTL_SECS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("Invalid TOKEN_TTL_SECS: {}", v))?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let coingecko_timeout_secs = match get("COINGECKO_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid COINGECKO_TIMEOUT_SECS: {}", v))?,
            None => DEFAULT_COINGECKO_TIMEOUT_SECS,
        };

        let enable_hsts = get("ENABLE_HSTS")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            jwt_secret,
            token_ttl_secs,
            watchlist_path: get("WATCHLIST_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_watchlist_path),
            coingecko_base_url: get("COINGECKO_BASE_URL")
                .unwrap_or_else(|| coingecko_client::BASE_URL.to_string()),
            coingecko_timeout_secs,
            enable_hsts,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// `data/watchList.json` next to the installed binary.
fn default_watchlist_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("data").join("watchList.json")))
        .unwrap_or_else(|| PathBuf::from("data").join("watchList.json"))
}

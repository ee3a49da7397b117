use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::decode::DecodePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // RPC (preflight simulation only)
    pub rpc_http_url: String,

    // Transaction builders
    pub aggregator_base_url: String,
    pub direct_pool_base_url: String,
    pub spot_path: String,
    pub leverage_path: String,
    pub request_timeout_ms: u64,
    pub strict_encoding: bool,

    // Token listing
    pub token_search_url: Option<String>,

    // Runtime
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_http_url: "https://api.mainnet-beta.solana.com".to_string(),
            aggregator_base_url: "http://127.0.0.1:8080/jup".to_string(),
            direct_pool_base_url: "http://127.0.0.1:8080/pump".to_string(),
            spot_path: "/spot".to_string(),
            leverage_path: "/leverage".to_string(),
            request_timeout_ms: 10_000,
            strict_encoding: false,
            token_search_url: None,
            log_json: false,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|s| s.trim().to_lowercase()) {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) if v == "1" || v == "true" || v == "yes" || v == "y" || v == "on" => true,
        Some(v) if v == "0" || v == "false" || v == "no" || v == "n" || v == "off" => false,
        Some(_) => default,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|x| x.trim().parse().ok())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn normalize_base_url(key: &str, url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(anyhow!("{key} cannot be empty"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!("{key} must be an http(s) URL, got {url:?}"));
    }
    Ok(url.to_string())
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        // RPC
        let rpc_http_url = env_string("TXR_RPC_HTTP")
            .or_else(|| env_string("VITE_RPC"))
            .unwrap_or(defaults.rpc_http_url);

        // Builders
        let aggregator_base_url =
            env_string("TXR_AGGREGATOR_URL").unwrap_or(defaults.aggregator_base_url);
        let direct_pool_base_url =
            env_string("TXR_DIRECT_POOL_URL").unwrap_or(defaults.direct_pool_base_url);
        let spot_path = env_string("TXR_SPOT_PATH").unwrap_or(defaults.spot_path);
        let leverage_path = env_string("TXR_LEVERAGE_PATH").unwrap_or(defaults.leverage_path);
        let request_timeout_ms =
            env_parse::<u64>("TXR_REQUEST_TIMEOUT_MS").unwrap_or(defaults.request_timeout_ms);
        let strict_encoding = env_bool("TXR_STRICT_ENCODING", defaults.strict_encoding);

        let token_search_url = env_string("TXR_TOKEN_SEARCH_URL");
        let log_json = env_bool("TXR_LOG_JSON", defaults.log_json);

        Self {
            rpc_http_url,
            aggregator_base_url,
            direct_pool_base_url,
            spot_path,
            leverage_path,
            request_timeout_ms,
            strict_encoding,
            token_search_url,
            log_json,
        }
        .validated()
    }

    /// Normalises URLs and paths and rejects unusable values.
    pub fn validated(mut self) -> Result<Self> {
        if self.request_timeout_ms == 0 {
            return Err(anyhow!("TXR_REQUEST_TIMEOUT_MS must be greater than 0"));
        }
        self.aggregator_base_url = normalize_base_url("TXR_AGGREGATOR_URL", &self.aggregator_base_url)?;
        self.direct_pool_base_url =
            normalize_base_url("TXR_DIRECT_POOL_URL", &self.direct_pool_base_url)?;
        self.spot_path = normalize_path(&self.spot_path);
        self.leverage_path = normalize_path(&self.leverage_path);
        if let Some(url) = self.token_search_url.take() {
            self.token_search_url = Some(normalize_base_url("TXR_TOKEN_SEARCH_URL", &url)?);
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn decode_policy(&self) -> DecodePolicy {
        if self.strict_encoding {
            DecodePolicy::Strict
        } else {
            DecodePolicy::Detect
        }
    }
}

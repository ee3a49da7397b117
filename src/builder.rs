use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::decode::TxEncoding;
use crate::domain::{IntentKind, TradeIntent};

/// Which of the two builder backends produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendTier {
    /// Route aggregator; emits versioned transactions.
    Primary,
    /// Direct pool builder; emits legacy transactions.
    Secondary,
}

impl BackendTier {
    pub fn label(self) -> &'static str {
        match self {
            BackendTier::Primary => "aggregator",
            BackendTier::Secondary => "direct_pool",
        }
    }

    pub fn assumed_encoding(self) -> TxEncoding {
        match self {
            BackendTier::Primary => TxEncoding::Versioned,
            BackendTier::Secondary => TxEncoding::Legacy,
        }
    }
}

impl fmt::Display for BackendTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderResponse {
    /// base64 encoded transaction
    pub encoded_transaction: String,
    pub encoding: TxEncoding,
    pub tier: BackendTier,
}

/// Outcome of a single builder request. Never an error: anything unusable is
/// folded into `NoRoute` or `TimedOut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildAttempt {
    Built(BuilderResponse),
    NoRoute(String),
    TimedOut,
}

impl BuildAttempt {
    pub fn into_response(self) -> Option<BuilderResponse> {
        match self {
            BuildAttempt::Built(resp) => Some(resp),
            BuildAttempt::NoRoute(_) | BuildAttempt::TimedOut => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BuildAttempt::TimedOut)
    }
}

#[async_trait]
pub trait TxBuilder: Send + Sync {
    async fn request_primary(&self, intent: &TradeIntent) -> BuildAttempt;
    async fn request_secondary(&self, intent: &TradeIntent) -> BuildAttempt;
}

#[derive(Debug, Deserialize)]
struct BuildResponseBody {
    #[serde(default)]
    tx: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BuilderClient {
    http: Client,
    aggregator_base_url: String,
    direct_pool_base_url: String,
    spot_path: String,
    leverage_path: String,
    timeout: Duration,
}

impl BuilderClient {
    pub fn new(cfg: &Config, http: Client) -> Self {
        Self {
            http,
            aggregator_base_url: cfg.aggregator_base_url.trim_end_matches('/').to_string(),
            direct_pool_base_url: cfg.direct_pool_base_url.trim_end_matches('/').to_string(),
            spot_path: cfg.spot_path.clone(),
            leverage_path: cfg.leverage_path.clone(),
            timeout: cfg.request_timeout(),
        }
    }

    /// Overrides the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, tier: BackendTier, kind: IntentKind) -> String {
        let base = match tier {
            BackendTier::Primary => &self.aggregator_base_url,
            BackendTier::Secondary => &self.direct_pool_base_url,
        };
        let path = match kind {
            IntentKind::Spot => &self.spot_path,
            IntentKind::Leverage => &self.leverage_path,
        };
        format!("{base}{path}")
    }

    async fn request(&self, tier: BackendTier, intent: &TradeIntent) -> BuildAttempt {
        let url = self.endpoint(tier, intent.kind);
        info!(backend = %tier, kind = %intent.kind, mint = %intent.mint, %url, "builder.request");

        let resp = match self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&intent.wire_body())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                warn!(backend = %tier, timeout_ms = self.timeout.as_millis() as u64, "builder.timeout");
                return BuildAttempt::TimedOut;
            }
            Err(e) => {
                warn!(backend = %tier, error = %e, "builder.transport_error");
                return BuildAttempt::NoRoute(format!("transport: {e}"));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(backend = %tier, %status, "builder.bad_status");
            return BuildAttempt::NoRoute(format!("status {status}"));
        }

        let body: BuildResponseBody = match resp.json().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                warn!(backend = %tier, "builder.timeout");
                return BuildAttempt::TimedOut;
            }
            Err(e) => {
                warn!(backend = %tier, error = %e, "builder.bad_body");
                return BuildAttempt::NoRoute(format!("body: {e}"));
            }
        };

        match body.tx.filter(|tx| !tx.trim().is_empty()) {
            Some(encoded_transaction) => {
                debug!(backend = %tier, len = encoded_transaction.len(), "builder.built");
                BuildAttempt::Built(BuilderResponse {
                    encoded_transaction,
                    encoding: tier.assumed_encoding(),
                    tier,
                })
            }
            None => {
                info!(backend = %tier, "builder.no_route");
                BuildAttempt::NoRoute("response has no tx".to_string())
            }
        }
    }
}

#[async_trait]
impl TxBuilder for BuilderClient {
    async fn request_primary(&self, intent: &TradeIntent) -> BuildAttempt {
        self.request(BackendTier::Primary, intent).await
    }

    async fn request_secondary(&self, intent: &TradeIntent) -> BuildAttempt {
        self.request(BackendTier::Secondary, intent).await
    }
}

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_change_24h: f64,
    #[serde(default)]
    pub volume_24h: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub liquidity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TokenInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match on name or symbol. `needle` must be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

struct BuiltinToken {
    address: &'static str,
    name: &'static str,
    symbol: &'static str,
    decimals: u8,
    /// `None` means the solana-labs token-list asset for `address`.
    logo: Option<&'static str>,
    price: f64,
    price_change_24h: f64,
    volume_24h: f64,
    market_cap: f64,
    liquidity: f64,
    tags: &'static [&'static str],
}

const BUILTIN: &[BuiltinToken] = &[
    BuiltinToken {
        address: "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
        name: "Bonk",
        symbol: "BONK",
        decimals: 5,
        logo: None,
        price: 0.000015,
        price_change_24h: 12.5,
        volume_24h: 45_000_000.0,
        market_cap: 1_200_000_000.0,
        liquidity: 15_000_000.0,
        tags: &["meme", "community"],
    },
    BuiltinToken {
        address: "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm",
        name: "dogwifhat",
        symbol: "WIF",
        decimals: 6,
        logo: None,
        price: 2.45,
        price_change_24h: -5.2,
        volume_24h: 85_000_000.0,
        market_cap: 2_450_000_000.0,
        liquidity: 35_000_000.0,
        tags: &["meme", "dog"],
    },
    BuiltinToken {
        address: "So11111111111111111111111111111111111111112",
        name: "Wrapped SOL",
        symbol: "SOL",
        decimals: 9,
        logo: None,
        price: 145.67,
        price_change_24h: 3.1,
        volume_24h: 125_000_000.0,
        market_cap: 68_500_000_000.0,
        liquidity: 250_000_000.0,
        tags: &["wrapped", "native"],
    },
    BuiltinToken {
        address: "HhJpBhRRn4g56VsyLuT8DL5Bv31HkXqsrahTTUCZeZg4",
        name: "Pepe",
        symbol: "PEPE",
        decimals: 6,
        logo: Some("https://assets.coingecko.com/coins/images/29850/large/pepe-token.jpeg"),
        price: 0.000008,
        price_change_24h: 18.7,
        volume_24h: 32_000_000.0,
        market_cap: 890_000_000.0,
        liquidity: 12_000_000.0,
        tags: &["meme", "frog"],
    },
    BuiltinToken {
        address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        name: "USD Coin",
        symbol: "USDC",
        decimals: 6,
        logo: None,
        price: 1.0,
        price_change_24h: 0.01,
        volume_24h: 450_000_000.0,
        market_cap: 32_000_000_000.0,
        liquidity: 180_000_000.0,
        tags: &["stablecoin", "usd"],
    },
    BuiltinToken {
        address: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
        name: "Tether USD",
        symbol: "USDT",
        decimals: 6,
        logo: None,
        price: 1.0,
        price_change_24h: -0.02,
        volume_24h: 380_000_000.0,
        market_cap: 95_000_000_000.0,
        liquidity: 220_000_000.0,
        tags: &["stablecoin", "usd"],
    },
    BuiltinToken {
        address: "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So",
        name: "Marinade staked SOL",
        symbol: "mSOL",
        decimals: 9,
        logo: None,
        price: 158.23,
        price_change_24h: 2.8,
        volume_24h: 25_000_000.0,
        market_cap: 1_800_000_000.0,
        liquidity: 45_000_000.0,
        tags: &["staking", "liquid"],
    },
    BuiltinToken {
        address: "7vfCXTUXx5WJV5JADk17DUJ4ksgau7utNKj4b963voxs",
        name: "Ethereum (Wormhole)",
        symbol: "ETH",
        decimals: 8,
        logo: None,
        price: 3245.12,
        price_change_24h: 4.2,
        volume_24h: 95_000_000.0,
        market_cap: 385_000_000_000.0,
        liquidity: 120_000_000.0,
        tags: &["wrapped", "ethereum"],
    },
    BuiltinToken {
        address: "3NZ9JMVBmGAqocybic2c7LQCJScmgsAZ6vQqTDzcqmJh",
        name: "Bitcoin (Wormhole)",
        symbol: "BTC",
        decimals: 8,
        logo: None,
        price: 68_450.0,
        price_change_24h: 1.8,
        volume_24h: 185_000_000.0,
        market_cap: 1_350_000_000_000.0,
        liquidity: 95_000_000.0,
        tags: &["wrapped", "bitcoin"],
    },
    BuiltinToken {
        address: "Saber2gLauYim4Mvftnrasomsv6NvAuncvMEZwcLpD1",
        name: "Saber",
        symbol: "SBR",
        decimals: 6,
        logo: None,
        price: 0.012,
        price_change_24h: -8.5,
        volume_24h: 3_500_000.0,
        market_cap: 45_000_000.0,
        liquidity: 8_000_000.0,
        tags: &["defi", "amm"],
    },
    BuiltinToken {
        address: "orcaEKTdK7LKz57vaAYr9QeNsVEPfiu6QeMU1kektZE",
        name: "Orca",
        symbol: "ORCA",
        decimals: 6,
        logo: None,
        price: 0.85,
        price_change_24h: 6.3,
        volume_24h: 12_000_000.0,
        market_cap: 125_000_000.0,
        liquidity: 25_000_000.0,
        tags: &["defi", "amm"],
    },
    BuiltinToken {
        address: "RLBxxFkseAZ4RgJH3Sqn8jXxhmGoz9jWxDNJMh8pL7a",
        name: "Rollbit Coin",
        symbol: "RLB",
        decimals: 2,
        logo: Some("https://assets.coingecko.com/coins/images/30171/large/RLB.png"),
        price: 0.045,
        price_change_24h: -12.3,
        volume_24h: 8_500_000.0,
        market_cap: 285_000_000.0,
        liquidity: 15_000_000.0,
        tags: &["gaming", "casino"],
    },
];

impl From<&BuiltinToken> for TokenInfo {
    fn from(t: &BuiltinToken) -> Self {
        let logo_uri = match t.logo {
            Some(url) => url.to_string(),
            None => format!(
                "https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/{}/logo.png",
                t.address
            ),
        };
        Self {
            address: t.address.to_string(),
            name: t.name.to_string(),
            symbol: t.symbol.to_string(),
            decimals: t.decimals,
            logo_uri,
            price: t.price,
            price_change_24h: t.price_change_24h,
            volume_24h: t.volume_24h,
            market_cap: t.market_cap,
            liquidity: t.liquidity,
            tags: t.tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Static list served when the search backend is missing or failing.
pub fn builtin_tokens() -> Vec<TokenInfo> {
    BUILTIN.iter().map(TokenInfo::from).collect()
}

/// Offline search over the built-in list. A blank query returns everything.
pub fn search_builtin(query: Option<&str>) -> Vec<TokenInfo> {
    let needle = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
    builtin_tokens().into_iter().filter(|t| t.matches(&needle)).collect()
}

pub fn token_by_address(address: &str) -> Option<TokenInfo> {
    BUILTIN.iter().find(|t| t.address == address).map(TokenInfo::from)
}

pub fn token_by_symbol(symbol: &str) -> Option<TokenInfo> {
    BUILTIN
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
        .map(TokenInfo::from)
}

/// Top five built-in tokens by 24h volume.
pub fn trending_tokens() -> Vec<TokenInfo> {
    let mut tokens = builtin_tokens();
    tokens.sort_by(|a, b| b.volume_24h.total_cmp(&a.volume_24h));
    tokens.truncate(5);
    tokens
}

pub fn meme_tokens() -> Vec<TokenInfo> {
    builtin_tokens().into_iter().filter(|t| t.has_tag("meme")).collect()
}

#[derive(Debug, Clone)]
pub struct TokenDirectory {
    http: Client,
    search_url: Option<String>,
    timeout: Duration,
}

impl TokenDirectory {
    pub fn new(cfg: &Config, http: Client) -> Self {
        Self {
            http,
            search_url: cfg.token_search_url.clone(),
            timeout: cfg.request_timeout(),
        }
    }

    /// Remote search; the filtered built-in list answers any failure.
    pub async fn search(&self, query: Option<&str>) -> Vec<TokenInfo> {
        let Some(url) = self.search_url.as_deref() else {
            return search_builtin(query);
        };

        match self.fetch(url, query).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, query = query.unwrap_or(""), "tokens.search_failed");
                search_builtin(query)
            }
        }
    }

    async fn fetch(&self, url: &str, query: Option<&str>) -> anyhow::Result<Vec<TokenInfo>> {
        let mut req = self.http.get(url).timeout(self.timeout);
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            req = req.query(&[("q", q)]);
        }
        let resp = req.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}

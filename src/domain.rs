use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Spot,
    Leverage,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::Spot => "spot",
            IntentKind::Leverage => "leverage",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub kind: IntentKind,
    pub mint: String,
    pub wallet_address: String,
    /// Decimal amount exactly as the user typed it.
    pub amount: String,
}

impl TradeIntent {
    pub fn new(
        kind: IntentKind,
        mint: impl Into<String>,
        wallet_address: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            mint: mint.into(),
            wallet_address: wallet_address.into(),
            amount: amount.into(),
        }
    }

    pub fn spot(mint: impl Into<String>, wallet_address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self::new(IntentKind::Spot, mint, wallet_address, amount)
    }

    pub fn leverage(mint: impl Into<String>, wallet_address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self::new(IntentKind::Leverage, mint, wallet_address, amount)
    }

    /// Rejects intents that must never reach a builder backend.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.mint.trim().is_empty() {
            return Err(ResolveError::InvalidIntent("mint is empty".into()));
        }
        if self.wallet_address.trim().is_empty() {
            return Err(ResolveError::InvalidIntent("wallet address is empty".into()));
        }
        let amount: f64 = self
            .amount
            .trim()
            .parse()
            .map_err(|_| ResolveError::InvalidIntent(format!("amount is not numeric: {:?}", self.amount)))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ResolveError::InvalidIntent(format!(
                "amount must be positive: {:?}",
                self.amount
            )));
        }
        Ok(())
    }

    pub(crate) fn wire_body(&self) -> BuildRequest<'_> {
        BuildRequest {
            mint: self.mint.trim(),
            address: self.wallet_address.trim(),
            amount: self.amount.trim(),
        }
    }
}

/// JSON body accepted by both builder backends.
#[derive(Debug, Serialize)]
pub(crate) struct BuildRequest<'a> {
    pub mint: &'a str,
    pub address: &'a str,
    pub amount: &'a str,
}

//! Resolves spot and leverage trade intents into decoded Solana transactions.
//!
//! A [`Resolver`] asks the route aggregator for a built transaction, falls back
//! to the direct pool builder once, and decodes whichever payload it accepted
//! into a [`CanonicalTransaction`] ready for a wallet to sign.

pub mod builder;
pub mod config;
pub mod decode;
pub mod domain;
pub mod error;
pub mod monitoring;
pub mod resolver;
pub mod tokens;

pub use builder::{BackendTier, BuildAttempt, BuilderClient, BuilderResponse, TxBuilder};
pub use config::Config;
pub use decode::{CanonicalTransaction, DecodePolicy, TxEncoding};
pub use domain::{IntentKind, TradeIntent};
pub use error::ResolveError;
pub use resolver::Resolver;
pub use tokens::{TokenDirectory, TokenInfo};

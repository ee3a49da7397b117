use std::fmt;

use base64::Engine as _;
use bincode::Options;
use serde::{Deserialize, Serialize};
use solana_sdk::message::VersionedMessage;
use solana_sdk::packet::PACKET_DATA_SIZE;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::sanitize::Sanitize;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use tracing::{debug, warn};

use crate::error::ResolveError;

/// Wire format of a serialized transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxEncoding {
    Legacy,
    Versioned,
}

impl fmt::Display for TxEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxEncoding::Legacy => f.write_str("legacy"),
            TxEncoding::Versioned => f.write_str("versioned"),
        }
    }
}

/// How a payload's encoding is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Trust the encoding implied by the backend that produced the payload.
    Strict,
    /// Versioned first, then legacy, regardless of the backend.
    #[default]
    Detect,
}

/// Decoded transaction ready to be handed to a wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl CanonicalTransaction {
    pub fn encoding(&self) -> TxEncoding {
        match self {
            CanonicalTransaction::Legacy(_) => TxEncoding::Legacy,
            CanonicalTransaction::Versioned(_) => TxEncoding::Versioned,
        }
    }

    /// Serialized message, i.e. the bytes a signer signs.
    pub fn message_bytes(&self) -> Vec<u8> {
        match self {
            CanonicalTransaction::Legacy(tx) => tx.message_data(),
            CanonicalTransaction::Versioned(tx) => tx.message.serialize(),
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        match self {
            CanonicalTransaction::Legacy(tx) => &tx.signatures,
            CanonicalTransaction::Versioned(tx) => &tx.signatures,
        }
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        match self {
            CanonicalTransaction::Legacy(tx) => tx.message.account_keys.first(),
            CanonicalTransaction::Versioned(tx) => tx.message.static_account_keys().first(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        match self {
            CanonicalTransaction::Legacy(tx) => bincode::serialize(tx),
            CanonicalTransaction::Versioned(tx) => bincode::serialize(tx),
        }
    }

    pub fn to_base64(&self) -> Result<String, bincode::Error> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_bytes()?))
    }
}

fn wire_options() -> impl Options {
    bincode::options()
        .with_limit(PACKET_DATA_SIZE as u64)
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

fn decode_versioned(bytes: &[u8]) -> Result<VersionedTransaction, String> {
    let tx: VersionedTransaction = wire_options()
        .deserialize(bytes)
        .map_err(|e| format!("versioned deserialize: {e}"))?;
    tx.sanitize().map_err(|e| format!("versioned sanitize: {e}"))?;
    Ok(tx)
}

fn decode_legacy(bytes: &[u8]) -> Result<Transaction, String> {
    let tx: Transaction = wire_options()
        .deserialize(bytes)
        .map_err(|e| format!("legacy deserialize: {e}"))?;
    tx.sanitize().map_err(|e| format!("legacy sanitize: {e}"))?;
    Ok(tx)
}

/// Decodes raw wire bytes under `policy`, using `hint` as the expected format.
pub fn decode_bytes(
    bytes: &[u8],
    hint: TxEncoding,
    policy: DecodePolicy,
) -> Result<CanonicalTransaction, ResolveError> {
    if bytes.len() > PACKET_DATA_SIZE {
        return Err(ResolveError::MalformedTransaction(format!(
            "payload is {} bytes, larger than a packet ({PACKET_DATA_SIZE})",
            bytes.len()
        )));
    }

    let decoded = match policy {
        DecodePolicy::Strict => match hint {
            TxEncoding::Versioned => decode_versioned(bytes).map(CanonicalTransaction::Versioned),
            TxEncoding::Legacy => decode_legacy(bytes).map(CanonicalTransaction::Legacy),
        },
        DecodePolicy::Detect => detect(bytes),
    }
    .map_err(ResolveError::MalformedTransaction)?;

    if decoded.encoding() != hint {
        warn!(expected = %hint, actual = %decoded.encoding(), "decode.encoding_mismatch");
    }
    debug!(encoding = %decoded.encoding(), len = bytes.len(), "decode.ok");
    Ok(decoded)
}

fn detect(bytes: &[u8]) -> Result<CanonicalTransaction, String> {
    let versioned_err = match decode_versioned(bytes) {
        Ok(tx) => {
            return Ok(match tx.message {
                VersionedMessage::V0(_) => CanonicalTransaction::Versioned(tx),
                // A legacy message in a versioned envelope is byte-identical to a legacy tx.
                VersionedMessage::Legacy(_) => match tx.into_legacy_transaction() {
                    Some(legacy) => CanonicalTransaction::Legacy(legacy),
                    None => return Err("legacy message could not be unwrapped".to_string()),
                },
            });
        }
        Err(e) => e,
    };
    decode_legacy(bytes)
        .map(CanonicalTransaction::Legacy)
        .map_err(|legacy_err| format!("{versioned_err}; {legacy_err}"))
}

/// Base64-decodes a builder payload and decodes the transaction it carries.
pub fn decode_payload(
    encoded: &str,
    hint: TxEncoding,
    policy: DecodePolicy,
) -> Result<CanonicalTransaction, ResolveError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ResolveError::MalformedTransaction(format!("base64: {e}")))?;
    decode_bytes(&bytes, hint, policy)
}

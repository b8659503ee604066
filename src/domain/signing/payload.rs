//! Canonical bytes and digest handed to the external signer
//!
//! The payload layout is fixed by the network's signing scheme: the BCS
//! serialization of the transaction, prefixed with a 3-byte intent scope,
//! hashed with Blake2b-256. Any byte deviation produces a signature the
//! network rejects, so this module is covered by fixed vectors.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

use crate::chain::{UnsignedTransaction, DIGEST_LENGTH};
use crate::shared::errors::SwapError;

type Blake2b256 = Blake2b<U32>;

/// Intent scope: transaction data (as opposed to personal messages)
pub const INTENT_SCOPE_TRANSACTION: u8 = 0;
/// Intent version
pub const INTENT_VERSION_V0: u8 = 0;
/// Application id: the network itself
pub const INTENT_APP_ID: u8 = 0;

/// The 3-byte prefix scoping a signature to transaction execution
pub const INTENT_PREFIX: [u8; 3] = [
    INTENT_SCOPE_TRANSACTION,
    INTENT_VERSION_V0,
    INTENT_APP_ID,
];

/// Blake2b-256 of arbitrary bytes
pub fn blake2b256(bytes: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut hasher = Blake2b256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Everything the external signer needs: canonical transaction bytes, the
/// intent-prefixed message, and its digest. Deterministic and immutable;
/// a new trade always produces a new payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    pub tx_bytes: Vec<u8>,
    pub intent_message: Vec<u8>,
    pub digest: [u8; DIGEST_LENGTH],
}

impl SigningPayload {
    /// Serialize a transaction to canonical bytes and derive the signing
    /// digest. Consumes the transaction: once a payload exists, the
    /// transaction must not be mutated or reused for a different payload.
    pub fn for_transaction(tx: UnsignedTransaction) -> Result<Self, SwapError> {
        let tx_bytes = bcs::to_bytes(&tx)?;

        let mut intent_message = Vec::with_capacity(INTENT_PREFIX.len() + tx_bytes.len());
        intent_message.extend_from_slice(&INTENT_PREFIX);
        intent_message.extend_from_slice(&tx_bytes);

        let digest = blake2b256(&intent_message);

        Ok(Self {
            tx_bytes,
            intent_message,
            digest,
        })
    }

    pub fn tx_bytes_b64(&self) -> String {
        BASE64.encode(&self.tx_bytes)
    }

    pub fn digest_b64(&self) -> String {
        BASE64.encode(self.digest)
    }

    pub fn intent_b64(&self) -> String {
        BASE64.encode(INTENT_PREFIX)
    }
}

//! Signing payload construction and the detached signer capability

pub mod payload;

pub use payload::{SigningPayload, INTENT_PREFIX};

use async_trait::async_trait;

use crate::shared::errors::SwapError;

/// Detached passkey-backed signer. Holds transient signing authority for
/// the active session only; implementations must never persist key material.
#[async_trait]
pub trait PasskeySigner: Send + Sync {
    /// Sign a 32-byte digest. A user refusal surfaces as `SigningDeclined`.
    async fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>, SwapError>;
}

//! Core network types shared across the application

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Byte length of an account address
pub const ADDRESS_LENGTH: usize = 32;

/// Byte length of a transaction digest
pub const DIGEST_LENGTH: usize = 32;

/// 32-byte account address, displayed as 0x-prefixed hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Short form for logs: 0x1234..abcd
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}..{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        // Short addresses (e.g. 0x2) are left-padded to 32 bytes
        let padded = format!("{:0>64}", stripped);
        let bytes = hex::decode(&padded)?;
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("address must be {} bytes", ADDRESS_LENGTH))?;
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let bytes = <[u8; ADDRESS_LENGTH]>::deserialize(deserializer)?;
            Ok(Self(bytes))
        }
    }
}

/// 32-byte transaction digest, displayed as 0x-prefixed hex
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionDigest([u8; DIGEST_LENGTH]);

impl TransactionDigest {
    pub fn new(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }
}

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionDigest({})", self)
    }
}

impl FromStr for TransactionDigest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        let arr: [u8; DIGEST_LENGTH] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("digest must be {} bytes", DIGEST_LENGTH))?;
        Ok(Self(arr))
    }
}

impl Serialize for TransactionDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TransactionDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let bytes = <[u8; DIGEST_LENGTH]>::deserialize(deserializer)?;
            Ok(Self(bytes))
        }
    }
}

/// Fully qualified coin type tag, e.g. `0x2::coin::NATIVE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the type tag, used as a display fallback
    pub fn struct_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Coin metadata as reported by the network registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub icon_url: Option<String>,
}

/// A single call into an on-chain package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    pub package: Address,
    pub module: String,
    pub function: String,
    pub type_args: Vec<String>,
    pub args: Vec<Vec<u8>>,
}

/// Ordered list of calls executed atomically in one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgrammableBlock {
    pub commands: Vec<MoveCall>,
}

impl ProgrammableBlock {
    pub fn new(commands: Vec<MoveCall>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Transaction payload variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Mergeable programmable call block (the normal case)
    Programmable(ProgrammableBlock),
    /// Opaque system payload; cannot be combined with other operations
    System(Vec<u8>),
}

impl TransactionKind {
    pub fn command_count(&self) -> usize {
        match self {
            TransactionKind::Programmable(block) => block.commands.len(),
            TransactionKind::System(_) => 1,
        }
    }
}

/// Unsigned, network-ready transaction. Constructed by the swap builder,
/// consumed exactly once by the signing payload constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub sender: Address,
    pub kind: TransactionKind,
    pub gas_price: u64,
    pub gas_budget: u64,
}

impl UnsignedTransaction {
    pub fn new(sender: Address, kind: TransactionKind, gas_price: u64, gas_budget: u64) -> Self {
        Self {
            sender,
            kind,
            gas_price,
            gas_budget,
        }
    }
}

/// Finality state of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalityStatus {
    /// Accepted but not yet checkpointed
    Pending,
    /// Landed in a checkpoint; `error` carries the abort reason on failure
    Finalized {
        success: bool,
        error: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let addr: Address = "0x000000000000000000000000000000000000000000000000000000000000002a"
            .parse()
            .unwrap();
        assert_eq!(addr.as_bytes()[31], 0x2a);
        assert_eq!(
            addr.to_string(),
            "0x000000000000000000000000000000000000000000000000000000000000002a"
        );
    }

    #[test]
    fn test_short_address_left_padded() {
        let addr: Address = "0x2".parse().unwrap();
        assert_eq!(addr.as_bytes()[31], 0x02);
        assert_eq!(&addr.as_bytes()[..31], &[0u8; 31]);
    }

    #[test]
    fn test_address_rejects_overlong_input() {
        let too_long = format!("0x{}", "ab".repeat(33));
        assert!(too_long.parse::<Address>().is_err());
    }

    #[test]
    fn test_token_id_struct_name() {
        let token = TokenId::new("0x2::coin::NATIVE");
        assert_eq!(token.struct_name(), "NATIVE");
    }

    #[test]
    fn test_bcs_serialization_is_compact() {
        let addr = Address::new([7u8; 32]);
        let bytes = bcs::to_bytes(&addr).unwrap();
        // Raw 32 bytes in binary form, no hex expansion
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn test_json_serialization_is_hex() {
        let addr = Address::new([7u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert!(json.contains("0x0707"));
    }
}

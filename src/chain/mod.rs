//! Move-network primitives: addresses, coin types, transaction data

pub mod types;

pub use types::{
    Address, CoinMetadata, FinalityStatus, MoveCall, ProgrammableBlock, TokenId,
    TransactionDigest, TransactionKind, UnsignedTransaction, ADDRESS_LENGTH, DIGEST_LENGTH,
};

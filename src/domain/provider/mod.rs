//! Swap provider abstraction: capability interface and registry

pub mod interface;
pub mod registry;

#[cfg(test)]
pub mod mock;

pub use interface::{BuildRequest, ProviderBuild, SwapProvider};
pub use registry::ProviderRegistry;

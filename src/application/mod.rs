pub mod services;

pub use services::{SwapRequest, SwapService};

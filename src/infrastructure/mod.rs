pub mod fullnode;
pub mod token_registry;

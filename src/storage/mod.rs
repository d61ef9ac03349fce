// src/storage/mod.rs
pub mod registry;
pub mod types;
pub mod vault;

pub use registry::PluginRegistry;
pub use types::{PluginHealth, PluginRecord};
pub use vault::CredentialVault;

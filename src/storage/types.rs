// src/storage/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::onboarding::types::{AuthMode, PluginCategory};

/// Durable record of an onboarded plugin. Created exactly once per id;
/// a second create for the same id is rejected, never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginRecord {
    pub id: String,
    /// host:port of the plugin's management endpoint.
    pub address: String,
    pub user_name: String,
    /// Vault output, nonce-prefixed AES-256-GCM. The plaintext never
    /// touches the store.
    pub encrypted_password: Vec<u8>,
    pub auth_mode: AuthMode,
    pub category: PluginCategory,
    pub status: PluginHealth,
    /// UUID of the manager discovered during the verification fetch,
    /// when the negotiated flow performed one.
    pub manager_uuid: Option<String>,
    pub onboarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PluginHealth {
    Enabled,
    Disabled,
}

// src/core/onboarding/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::network::contact::{ContactCredentials, ManagerInfo, PluginStatusResponse};
use crate::utils::error::AggregatorError;

/// Inbound add-plugin request. Wire enum fields arrive as strings and are
/// validated into the closed enums below before any network call.
/// Immutable once accepted; never persisted in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPluginRequest {
    #[serde(rename = "ManagerAddress")]
    pub manager_address: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Oem")]
    pub oem: PluginDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    #[serde(rename = "PluginID")]
    pub plugin_id: String,
    #[serde(rename = "PreferredAuthType")]
    pub preferred_auth_type: String,
    #[serde(rename = "PluginType")]
    pub plugin_type: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthMode {
    BasicAuth,
    XAuthToken,
}

impl FromStr for AuthMode {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BasicAuth" => Ok(AuthMode::BasicAuth),
            "XAuthToken" => Ok(AuthMode::XAuthToken),
            other => Err(AggregatorError::Validation(format!(
                "unsupported PreferredAuthType {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::BasicAuth => write!(f, "BasicAuth"),
            AuthMode::XAuthToken => write!(f, "XAuthToken"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PluginCategory {
    Compute,
}

impl FromStr for PluginCategory {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Compute" => Ok(PluginCategory::Compute),
            other => Err(AggregatorError::Validation(format!(
                "unsupported PluginType {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginCategory::Compute => write!(f, "Compute"),
        }
    }
}

/// Outcome of a successful negotiation: the credentials every later
/// device-facing call should carry, the probe result, and the manager
/// fetched during verification when the flow performed one. Held only in
/// memory for the duration of onboarding.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub credentials: ContactCredentials,
    pub status: PluginStatusResponse,
    pub manager: Option<ManagerInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_modes_parse() {
        assert_eq!("BasicAuth".parse::<AuthMode>().unwrap(), AuthMode::BasicAuth);
        assert_eq!(
            "XAuthToken".parse::<AuthMode>().unwrap(),
            AuthMode::XAuthToken
        );
    }

    #[test]
    fn unknown_auth_mode_is_validation_error() {
        let err = "BasicAuthentication".parse::<AuthMode>().unwrap_err();
        assert!(matches!(err, AggregatorError::Validation(_)));
    }

    #[test]
    fn unknown_plugin_type_is_validation_error() {
        let err = "plugin".parse::<PluginCategory>().unwrap_err();
        assert!(matches!(err, AggregatorError::Validation(_)));
    }

    #[test]
    fn request_decodes_from_wire_shape() {
        let body = serde_json::json!({
            "ManagerAddress": "localhost:9091",
            "UserName": "admin",
            "Password": "password",
            "Oem": {
                "PluginID": "GRF",
                "PreferredAuthType": "BasicAuth",
                "PluginType": "Compute"
            }
        });

        let request: AddPluginRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.oem.plugin_id, "GRF");
    }
}

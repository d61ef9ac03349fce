// src/network/contact.rs
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::utils::{
    config::ContactConfig,
    error::{AggregatorError, Result},
};

const STATUS_PATH: &str = "/ODIM/v1/Status";
const SESSION_PATH: &str = "/ODIM/v1/Session";
const MANAGERS_PATH: &str = "/ODIM/v1/Managers";
const SUBSCRIPTIONS_PATH: &str = "/ODIM/v1/Subscriptions";

/// Credentials attached to device-facing calls, per the negotiated auth
/// mode. Token holds a session token and is never persisted.
#[derive(Debug, Clone)]
pub enum ContactCredentials {
    Basic { username: String, password: String },
    Token(String),
}

/// Liveness/status shape reported by a plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginStatusResponse {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
    #[serde(rename = "Status")]
    pub status: StatusSummary,
    #[serde(rename = "EventMessageBus", default)]
    pub event_message_bus: Option<EmbInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSummary {
    #[serde(rename = "Available")]
    pub available: String,
    #[serde(rename = "Uptime", default)]
    pub uptime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbInfo {
    #[serde(rename = "EmbType")]
    pub emb_type: String,
    #[serde(rename = "EmbQueue", default)]
    pub queues: Vec<EmbQueue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbQueue {
    #[serde(rename = "QueueName")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerInfo {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "ManagerType", default)]
    pub manager_type: Option<String>,
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "FirmwareVersion", default)]
    pub firmware_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManagerCollection {
    #[serde(rename = "Members")]
    members: Vec<OdataRef>,
}

#[derive(Debug, Deserialize)]
struct OdataRef {
    #[serde(rename = "@odata.id")]
    odata_id: String,
}

/// Outbound calls to a remote plugin. Every implementation must keep the
/// failure dichotomy: connection/timeout trouble surfaces as Unavailable,
/// a received-but-undecodable body as Protocol.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteContact: Send + Sync {
    async fn probe_status(&self, address: &str) -> Result<PluginStatusResponse>;

    /// Exchanges username/password for a session token (X-Auth-Token).
    async fn create_session(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<String>;

    async fn fetch_manager_info(
        &self,
        address: &str,
        credentials: &ContactCredentials,
    ) -> Result<ManagerInfo>;

    async fn create_subscription(
        &self,
        address: &str,
        credentials: &ContactCredentials,
        destination: &str,
    ) -> Result<()>;
}

/// reqwest-backed client with an enforced per-request timeout. Timeout
/// expiry is classified exactly like a refused connection.
pub struct ReqwestContactClient {
    client: reqwest::Client,
    scheme: &'static str,
}

impl ReqwestContactClient {
    pub fn new(config: &ContactConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AggregatorError::Config(e.to_string()))?;

        Ok(Self {
            client,
            scheme: if config.secure { "https" } else { "http" },
        })
    }

    fn url(&self, address: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, address, path)
    }

    fn authenticated(
        &self,
        builder: reqwest::RequestBuilder,
        credentials: &ContactCredentials,
    ) -> reqwest::RequestBuilder {
        match credentials {
            ContactCredentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            ContactCredentials::Token(token) => builder.header("X-Auth-Token", token.as_str()),
        }
    }
}

fn unreachable(address: &str, err: reqwest::Error) -> AggregatorError {
    if err.is_timeout() {
        AggregatorError::Unavailable(format!("{} timed out: {}", address, err))
    } else {
        AggregatorError::Unavailable(format!("{} unreachable: {}", address, err))
    }
}

fn undecodable(address: &str, what: &str, err: reqwest::Error) -> AggregatorError {
    AggregatorError::Protocol(format!("{} returned an undecodable {}: {}", address, what, err))
}

#[async_trait]
impl RemoteContact for ReqwestContactClient {
    async fn probe_status(&self, address: &str) -> Result<PluginStatusResponse> {
        debug!("Probing plugin status at {}", address);
        let response = self
            .client
            .get(self.url(address, STATUS_PATH))
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        if !response.status().is_success() {
            return Err(AggregatorError::Unavailable(format!(
                "{} status probe returned {}",
                address,
                response.status()
            )));
        }

        response
            .json::<PluginStatusResponse>()
            .await
            .map_err(|e| undecodable(address, "status body", e))
    }

    async fn create_session(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(self.url(address, SESSION_PATH))
            .json(&json!({ "UserName": username, "Password": password }))
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AggregatorError::Auth(format!(
                "{} rejected the supplied credentials",
                address
            )));
        }
        if !response.status().is_success() {
            return Err(AggregatorError::Unavailable(format!(
                "{} session creation returned {}",
                address,
                response.status()
            )));
        }

        match response.headers().get("X-Auth-Token") {
            Some(token) => token
                .to_str()
                .map(str::to_owned)
                .map_err(|_| {
                    AggregatorError::Protocol(format!(
                        "{} returned a non-ASCII session token",
                        address
                    ))
                }),
            None => Err(AggregatorError::Protocol(format!(
                "{} created a session without an X-Auth-Token header",
                address
            ))),
        }
    }

    async fn fetch_manager_info(
        &self,
        address: &str,
        credentials: &ContactCredentials,
    ) -> Result<ManagerInfo> {
        let response = self
            .authenticated(self.client.get(self.url(address, MANAGERS_PATH)), credentials)
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AggregatorError::Auth(format!(
                "{} rejected the negotiated credentials",
                address
            )));
        }
        if !response.status().is_success() {
            return Err(AggregatorError::Unavailable(format!(
                "{} manager fetch returned {}",
                address,
                response.status()
            )));
        }

        let collection = response
            .json::<ManagerCollection>()
            .await
            .map_err(|e| undecodable(address, "manager collection", e))?;

        let member = collection.members.first().ok_or_else(|| {
            AggregatorError::Protocol(format!("{} exposes no managers", address))
        })?;

        let response = self
            .authenticated(
                self.client.get(self.url(address, &member.odata_id)),
                credentials,
            )
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        if !response.status().is_success() {
            return Err(AggregatorError::Unavailable(format!(
                "{} manager fetch returned {}",
                address,
                response.status()
            )));
        }

        response
            .json::<ManagerInfo>()
            .await
            .map_err(|e| undecodable(address, "manager body", e))
    }

    async fn create_subscription(
        &self,
        address: &str,
        credentials: &ContactCredentials,
        destination: &str,
    ) -> Result<()> {
        let body = json!({
            "Destination": destination,
            "EventTypes": ["ResourceAdded", "ResourceRemoved", "Alert"],
            "Context": "Aggregator event subscription",
            "Protocol": "Redfish",
        });

        let response = self
            .authenticated(self.client.post(self.url(address, SUBSCRIPTIONS_PATH)), credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        if !response.status().is_success() {
            return Err(AggregatorError::Event(format!(
                "{} subscription returned {}",
                address,
                response.status()
            )));
        }

        Ok(())
    }
}

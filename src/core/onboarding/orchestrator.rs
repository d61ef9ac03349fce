// src/core/onboarding/orchestrator.rs
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    auth::AuthNegotiator,
    dedup::{ActiveRequests, InFlightGuard},
    types::{AddPluginRequest, AuthMode, PluginCategory},
};
use crate::{
    api::types::RpcResponse,
    core::{events::EventBridge, tasks::TaskService},
    network::contact::RemoteContact,
    storage::{
        types::{PluginHealth, PluginRecord},
        CredentialVault, PluginRegistry,
    },
    utils::error::{AggregatorError, Result},
};

/// Top-level coordinator for the add-plugin protocol:
/// validate → existence check → dedup guard → auth handshake → encrypt &
/// persist → subscribe/publish (best effort) → task terminal state.
///
/// Each request runs on its own spawned worker; the HTTP handler returns
/// the task handle without waiting for the handshake.
pub struct OnboardingService {
    registry: Arc<PluginRegistry>,
    vault: Arc<CredentialVault>,
    negotiator: AuthNegotiator,
    tasks: Arc<TaskService>,
    events: Arc<EventBridge>,
    active: ActiveRequests,
}

impl OnboardingService {
    pub fn new(
        registry: Arc<PluginRegistry>,
        vault: Arc<CredentialVault>,
        contact: Arc<dyn RemoteContact>,
        tasks: Arc<TaskService>,
        events: Arc<EventBridge>,
    ) -> Self {
        Self {
            registry,
            vault,
            negotiator: AuthNegotiator::new(contact),
            tasks,
            events,
            active: ActiveRequests::new(),
        }
    }

    /// Runs the whole onboarding protocol and reports the terminal state
    /// both in the returned envelope and through the task service.
    pub async fn add_plugin(
        &self,
        task_id: Uuid,
        caller: &str,
        request: &AddPluginRequest,
    ) -> RpcResponse {
        info!(
            "Onboarding request from {} for plugin {} at {}",
            caller, request.oem.plugin_id, request.manager_address
        );

        // The in-flight guard outlives the task update below, so a retry
        // for the same address cannot start before the terminal state is
        // recorded.
        let mut guard = None;
        match self.onboard(task_id, request, &mut guard).await {
            Ok(record) => {
                self.tasks
                    .complete_task(task_id, &format!("plugin {} onboarded", record.id))
                    .await;
                RpcResponse::ok(json!({
                    "Id": record.id,
                    "ManagerAddress": record.address,
                    "PluginType": record.category,
                    "Status": record.status,
                    "ManagerUUID": record.manager_uuid,
                }))
            }
            Err(err) => {
                let status = err.status_code();
                warn!(
                    "Onboarding of plugin {} failed with {}: {}",
                    request.oem.plugin_id, status, err
                );
                self.tasks
                    .fail_task(task_id, status, &err.to_string())
                    .await;
                RpcResponse::from_error(&err)
            }
        }
    }

    /// True while an onboarding attempt is in flight for `address`.
    pub fn is_onboarding(&self, address: &str) -> bool {
        self.active.is_active(address)
    }

    async fn onboard(
        &self,
        task_id: Uuid,
        request: &AddPluginRequest,
        guard: &mut Option<InFlightGuard>,
    ) -> Result<PluginRecord> {
        // Pure input validation; rejected before any network call.
        let (auth_mode, category) = validate(request)?;

        // The presence check outranks anything stored under the id: a
        // corrupted or legacy-encrypted record still means Conflict.
        if self.registry.exists(&request.oem.plugin_id)? {
            return Err(AggregatorError::Conflict(format!(
                "plugin {} already registered",
                request.oem.plugin_id
            )));
        }

        // Single-flight per target address. The guard lives in the
        // caller's slot so it is released only once the task has reached
        // its terminal state.
        *guard = Some(
            self.active
                .try_acquire(&request.manager_address)
                .ok_or_else(|| {
                    AggregatorError::Conflict(format!(
                        "an onboarding request for {} is already in progress",
                        request.manager_address
                    ))
                })?,
        );

        self.report_progress(task_id, 10, "contacting remote plugin").await;

        let session = self
            .negotiator
            .negotiate(
                auth_mode,
                &request.manager_address,
                &request.user_name,
                &request.password,
            )
            .await?;

        self.report_progress(task_id, 60, "authentication negotiated").await;

        let encrypted_password = self.vault.encrypt(request.password.as_bytes())?;
        let record = PluginRecord {
            id: request.oem.plugin_id.clone(),
            address: request.manager_address.clone(),
            user_name: request.user_name.clone(),
            encrypted_password,
            auth_mode,
            category,
            status: PluginHealth::Enabled,
            manager_uuid: session.manager.as_ref().map(|m| m.uuid.clone()),
            onboarded_at: chrono::Utc::now(),
        };

        // create() re-checks the id under its own lock, so a writer that
        // lost the race since the earlier existence check gets Conflict
        // here instead of overwriting.
        self.registry.create(&record)?;

        self.report_progress(task_id, 80, "plugin record persisted").await;

        // Best-effort boundary: the record stays persisted even when the
        // event wiring fails.
        if let Err(e) = self
            .events
            .create_subscription(&record, &session.credentials)
            .await
        {
            error!("Event subscription for plugin {} failed: {}", record.id, e);
        }
        if let Some(emb) = &session.status.event_message_bus {
            let topics: Vec<String> = emb.queues.iter().map(|q| q.name.clone()).collect();
            self.events.subscribe_emb(&topics);
        }
        self.events
            .publish_resource_added(&record.id, &record.address);

        Ok(record)
    }

    async fn report_progress(&self, task_id: Uuid, percent: u8, message: &str) {
        if let Err(e) = self.tasks.update_task(task_id, percent, message).await {
            warn!("Progress update for task {} dropped: {}", task_id, e);
        }
    }
}

fn validate(request: &AddPluginRequest) -> Result<(AuthMode, PluginCategory)> {
    if request.oem.plugin_id.is_empty() {
        return Err(AggregatorError::Validation("PluginID must not be empty".into()));
    }
    if request.user_name.is_empty() || request.password.is_empty() {
        return Err(AggregatorError::Validation(
            "UserName and Password must not be empty".into(),
        ));
    }
    let address_ok = request
        .manager_address
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false);
    if !address_ok {
        return Err(AggregatorError::Validation(
            "ManagerAddress must be of the form host:port".into(),
        ));
    }

    let auth_mode = request.oem.preferred_auth_type.parse()?;
    let category = request.oem.plugin_type.parse()?;
    Ok((auth_mode, category))
}

pub mod api;
pub mod core;
pub mod network;
pub mod storage;
pub mod utils;

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    core::{events::EventBridge, onboarding::OnboardingService, tasks::TaskService},
    network::contact::{RemoteContact, ReqwestContactClient},
    storage::{CredentialVault, PluginRegistry},
    utils::{
        config::Config,
        error::{AggregatorError, Result},
    },
};

pub struct Application {
    config: Arc<Config>,
    onboarding: Arc<OnboardingService>,
    tasks: Arc<TaskService>,
    server: RwLock<Option<actix_web::dev::ServerHandle>>,
}

impl Application {
    pub async fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        info!("Initializing credential vault...");
        let vault = Arc::new(CredentialVault::new(config.security.vault_key.as_bytes())?);

        info!("Initializing plugin registry...");
        let registry = Arc::new(PluginRegistry::open(&config.storage.path)?);

        info!("Initializing remote contact client...");
        let contact: Arc<dyn RemoteContact> =
            Arc::new(ReqwestContactClient::new(&config.contact)?);

        info!("Initializing services...");
        let tasks = Arc::new(TaskService::new());
        let destination = format!(
            "https://{}:{}/redfish/v1/EventService/Events",
            config.node.host, config.node.port
        );
        let events = Arc::new(EventBridge::new(contact.clone(), destination));
        let onboarding = Arc::new(OnboardingService::new(
            registry,
            vault,
            contact,
            tasks.clone(),
            events,
        ));

        Ok(Self {
            config,
            onboarding,
            tasks,
            server: RwLock::new(None),
        })
    }

    pub async fn start(&self) -> Result<()> {
        use actix_web::{web, App, HttpServer};
        use crate::api::handlers;

        info!("Starting API server...");
        let onboarding = self.onboarding.clone();
        let tasks = self.tasks.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::from(onboarding.clone()))
                .app_data(web::Data::from(tasks.clone()))
                .service(handlers::aggregation::scope())
        })
        .bind((self.config.node.host.as_str(), self.config.node.port))
        .map_err(|e| AggregatorError::Config(format!("Failed to bind API server: {}", e)))?
        .run();

        *self.server.write().await = Some(server.handle());
        tokio::spawn(server);

        info!(
            "Aggregator listening on {}:{}",
            self.config.node.host, self.config.node.port
        );
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down aggregator...");
        if let Some(handle) = self.server.write().await.take() {
            handle.stop(true).await;
        }
        info!("Shutdown complete");
        Ok(())
    }
}

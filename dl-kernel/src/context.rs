//! Process-wide kernel context.

use std::sync::Arc;

use chrono::Utc;
use dl_kernel_common::{KernelMessage, PROTOCOL_VERSION};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::{HostGateway, Workspace};
use crate::network_type::{DeclaredNetworkType, NetworkTypeRegistry};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything kernel code needs to reach the host and the network types.
///
/// Built once at start-up and passed to whoever needs it.
pub struct KernelContext {
    pub config: Config,
    pub network_types: Arc<NetworkTypeRegistry>,
    pub gateway: Arc<HostGateway>,
}

impl KernelContext {
    pub fn new(
        config: Config,
        network_types: Arc<NetworkTypeRegistry>,
        gateway: Arc<HostGateway>,
    ) -> Self {
        Self {
            config,
            network_types,
            gateway,
        }
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        self.gateway.workspace()
    }

    /// Register the network types declared in the configuration.
    pub async fn register_declared_network_types(&self) -> Result<()> {
        for declared in &self.config.network_types {
            let network_type = DeclaredNetworkType::new(
                declared.identifier.clone(),
                declared.backend_module_names.clone(),
            );
            self.network_types.register(Arc::new(network_type)).await?;
            tracing::info!(
                "Registered network type {} ({})",
                declared.identifier,
                declared.backend_module_names.join(", ")
            );
        }
        Ok(())
    }

    /// Tell the host the kernel is up.
    pub async fn announce_ready(&self) -> Result<()> {
        let message = KernelMessage::Ready {
            protocol_version: PROTOCOL_VERSION,
            kernel_version: VERSION.to_string(),
            started_at: Utc::now(),
            network_types: self.network_types.infos().await,
        };
        self.gateway
            .send_to_host(message)
            .await
            .map_err(Error::Transmit)?;
        Ok(())
    }
}

//! Command handlers -- one module per subcommand

pub mod action;
pub mod config;
pub mod console;
pub mod create;
pub mod list;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use berth_core::config::BerthConfig;
use berth_lifecycle::{BollardRuntimeClient, LifecycleManager, LifecycleManagerBuilder, ManagerConfig};

use crate::error::CliError;
use crate::output::StdoutSink;

/// Manager over the Docker Engine API.
pub type DockerManager = LifecycleManager<BollardRuntimeClient>;

/// Connect to the runtime, build the manager, and populate its registry.
///
/// # Errors
///
/// `CliError::RuntimeUnavailable` when the Docker socket cannot be reached.
pub async fn connect_manager(config: &BerthConfig) -> Result<Arc<DockerManager>, CliError> {
    let manager_config = ManagerConfig::from_core(&config.manager);
    let client = BollardRuntimeClient::connect(
        &manager_config.docker_socket,
        Duration::from_secs(manager_config.docker_timeout_secs),
    )?;

    let manager = LifecycleManagerBuilder::new()
        .config(manager_config)
        .client(Arc::new(client))
        .sink(Arc::new(StdoutSink))
        .build()?;

    let instances = manager.initialize().await?;
    info!(instances, "connected to container runtime");
    Ok(Arc::new(manager))
}

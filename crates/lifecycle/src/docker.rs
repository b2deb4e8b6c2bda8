//! Container runtime abstraction for testability.
//!
//! The [`RuntimeClient`] trait abstracts the Docker Engine API, allowing the
//! manager to use [`BollardRuntimeClient`] in production while tests use an
//! in-memory fake.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ LifecycleManager │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌──────────────┐
//!   │RuntimeClient │ (trait)
//!   └──────────────┘
//!        │     │
//!        ▼     ▼
//!   ┌───────┐ ┌──────┐
//!   │Bollard│ │ Fake │
//!   └───┬───┘ └──────┘
//!       │
//!       ▼
//!   Docker Daemon
//! ```
//!
//! # Error mapping
//!
//! - HTTP 304: [`LifecycleError::NotModified`]
//! - HTTP 404: [`LifecycleError::ContainerNotFound`]
//! - transport failures: [`LifecycleError::RuntimeConnection`]
//! - everything else: [`LifecycleError::RuntimeApi`]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use berth_core::types::{ContainerSummary, PublishedPort};
use bollard::errors::Error as BollardError;
use futures::StreamExt;

use crate::error::LifecycleError;
use crate::sink::{OutputSink, write_frame};

/// Grace period before the runtime kills a stopping container.
const STOP_GRACE_SECS: i64 = 10;

/// Validates a container reference (ID or name) before it reaches the API.
fn validate_container_ref(reference: &str) -> Result<(), LifecycleError> {
    if reference.is_empty() || reference.len() > 128 {
        return Err(LifecycleError::RuntimeApi(format!(
            "invalid container reference: length {} (must be 1-128)",
            reference.len()
        )));
    }
    if !reference
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(LifecycleError::RuntimeApi(
            "invalid container reference: contains illegal characters".to_owned(),
        ));
    }
    Ok(())
}

/// Everything the runtime needs to create one server container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name (`<prefix>-<instance id>`).
    pub name: String,
    /// Image reference.
    pub image: String,
    /// `KEY=VALUE` environment entries.
    pub env: Vec<String>,
    /// Bind mounts in `host:container` form.
    pub binds: Vec<String>,
    /// Host interface the port is published on.
    pub host_ip: String,
    /// Published host port.
    pub host_port: u16,
    /// Service port inside the container.
    pub container_port: u16,
}

impl ContainerSpec {
    /// Port key in the runtime's `<port>/tcp` form.
    pub fn port_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

/// Trait abstracting container runtime operations.
///
/// All runtime calls go through this trait. The trait is `Send + Sync + 'static`,
/// so one client can be shared by the manager and its background tasks.
pub trait RuntimeClient: Send + Sync + 'static {
    /// Checks daemon connectivity.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::RuntimeConnection` if the daemon is unreachable.
    fn ping(&self) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Creates a container and returns its runtime ID.
    ///
    /// The container is created with restart policy `always`.
    fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> impl Future<Output = Result<String, LifecycleError>> + Send;

    /// Starts a container. Already running yields `NotModified`.
    fn start_container(&self, id: &str)
    -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Stops a container. Already stopped yields `NotModified`.
    fn stop_container(&self, id: &str) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Restarts a container.
    fn restart_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Removes a stopped container. Volumes and bind mounts are kept.
    fn remove_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Lists containers, including stopped ones when `all` is set.
    fn list_containers(
        &self,
        all: bool,
    ) -> impl Future<Output = Result<Vec<ContainerSummary>, LifecycleError>> + Send;

    /// Follows stdout/stderr of a container, writing each line to `sink`,
    /// until the runtime closes the stream.
    ///
    /// Callers bound this with a timeout; a running server never closes it.
    fn stream_logs(
        &self,
        id: &str,
        sink: &dyn OutputSink,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send;
}

/// Production runtime client over the Docker Engine API.
///
/// Internally uses `Arc<bollard::Docker>` for sharing across async tasks.
pub struct BollardRuntimeClient {
    docker: Arc<bollard::Docker>,
}

impl BollardRuntimeClient {
    /// Connects using the platform default socket.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::RuntimeConnection` if the client cannot be built.
    pub fn connect_local(timeout: Duration) -> Result<Self, LifecycleError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            LifecycleError::RuntimeConnection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker.with_timeout(timeout)),
        })
    }

    /// Connects using a specific socket path.
    pub fn connect_with_socket(socket_path: &str, timeout: Duration) -> Result<Self, LifecycleError> {
        let docker = bollard::Docker::connect_with_socket(
            socket_path,
            timeout.as_secs(),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            LifecycleError::RuntimeConnection(format!(
                "failed to connect to docker at {socket_path}: {e}"
            ))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects with the socket from configuration, or the platform default
    /// when `socket_path` is empty.
    pub fn connect(socket_path: &str, timeout: Duration) -> Result<Self, LifecycleError> {
        if socket_path.is_empty() {
            Self::connect_local(timeout)
        } else {
            Self::connect_with_socket(socket_path, timeout)
        }
    }
}

/// Maps a bollard error into the lifecycle taxonomy.
fn map_bollard_error(err: BollardError, reference: &str, operation: &str) -> LifecycleError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 304, ..
        } => LifecycleError::NotModified {
            container_id: reference.to_owned(),
        },
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => LifecycleError::ContainerNotFound(reference.to_owned()),
        e @ (BollardError::IOError { .. }
        | BollardError::RequestTimeoutError
        | BollardError::SocketNotFoundError(_)) => {
            LifecycleError::RuntimeConnection(format!("{operation} failed: {e}"))
        }
        e => LifecycleError::RuntimeApi(format!("{operation} failed: {e}")),
    }
}

fn to_summary(container: bollard::models::ContainerSummary) -> ContainerSummary {
    let name = container
        .names
        .unwrap_or_default()
        .first()
        .map(|n| n.trim_start_matches('/').to_owned())
        .unwrap_or_default();
    let ports = container
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| PublishedPort {
            private_port: p.private_port,
            public_port: p.public_port,
            protocol: p
                .typ
                .map(|t| t.to_string())
                .unwrap_or_else(|| "tcp".to_owned()),
        })
        .collect();

    ContainerSummary {
        id: container.id.unwrap_or_default(),
        name,
        image: container.image.unwrap_or_default(),
        state: container.state.unwrap_or_default(),
        ports,
    }
}

impl RuntimeClient for BollardRuntimeClient {
    async fn ping(&self) -> Result<(), LifecycleError> {
        self.docker
            .ping()
            .await
            .map_err(|e| LifecycleError::RuntimeConnection(format!("ping failed: {e}")))?;
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, LifecycleError> {
        validate_container_ref(&spec.name)?;

        use bollard::container::{Config, CreateContainerOptions};
        use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};

        let port_key = spec.port_key();
        let port_bindings = HashMap::from([(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: Some(spec.host_ip.clone()),
                host_port: Some(spec.host_port.to_string()),
            }]),
        )]);
        let host_config = HostConfig {
            binds: Some(spec.binds.clone()),
            port_bindings: Some(port_bindings),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::ALWAYS),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };
        let config = Config::<String> {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            exposed_ports: Some(HashMap::from([(port_key, HashMap::new())])),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| map_bollard_error(e, &spec.name, "create container"))?;

        for warning in &response.warnings {
            tracing::warn!(container = %spec.name, warning = %warning, "runtime warning on create");
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), LifecycleError> {
        validate_container_ref(id)?;

        use bollard::container::StartContainerOptions;

        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| map_bollard_error(e, id, "start container"))
    }

    async fn stop_container(&self, id: &str) -> Result<(), LifecycleError> {
        validate_container_ref(id)?;

        use bollard::container::StopContainerOptions;

        self.docker
            .stop_container(id, Some(StopContainerOptions { t: STOP_GRACE_SECS }))
            .await
            .map_err(|e| map_bollard_error(e, id, "stop container"))
    }

    async fn restart_container(&self, id: &str) -> Result<(), LifecycleError> {
        validate_container_ref(id)?;

        use bollard::container::RestartContainerOptions;

        self.docker
            .restart_container(
                id,
                Some(RestartContainerOptions {
                    t: STOP_GRACE_SECS as isize,
                }),
            )
            .await
            .map_err(|e| map_bollard_error(e, id, "restart container"))
    }

    async fn remove_container(&self, id: &str) -> Result<(), LifecycleError> {
        validate_container_ref(id)?;

        use bollard::container::RemoveContainerOptions;

        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    v: false,
                    force: false,
                    link: false,
                }),
            )
            .await
            .map_err(|e| map_bollard_error(e, id, "remove container"))
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, LifecycleError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| map_bollard_error(e, "*", "list containers"))?;

        Ok(containers.into_iter().map(to_summary).collect())
    }

    async fn stream_logs(&self, id: &str, sink: &dyn OutputSink) -> Result<(), LifecycleError> {
        validate_container_ref(id)?;

        use bollard::container::{LogOutput, LogsOptions};

        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = Box::pin(self.docker.logs(id, Some(options)));

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                    write_frame(sink, &message);
                }
                Ok(_) => {}
                Err(e) => return Err(map_bollard_error(e, id, "stream logs")),
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockRuntimeClient;
    use super::*;
    use crate::sink::MemorySink;

    fn sample_spec(name: &str, port: u16) -> ContainerSpec {
        ContainerSpec {
            name: name.to_owned(),
            image: "itzg/minecraft-server".to_owned(),
            env: vec!["EULA=TRUE".to_owned()],
            binds: vec![format!("/srv/{name}/server:/data")],
            host_ip: "0.0.0.0".to_owned(),
            host_port: port,
            container_port: 25565,
        }
    }

    #[test]
    fn port_key_is_tcp() {
        assert_eq!(sample_spec("a", 10000).port_key(), "25565/tcp");
    }

    #[test]
    fn container_ref_validation() {
        assert!(validate_container_ref("abc123").is_ok());
        assert!(validate_container_ref("gameserver-4f9a.x_y").is_ok());
        assert!(validate_container_ref("").is_err());
        assert!(validate_container_ref("a;rm -rf").is_err());
        assert!(validate_container_ref(&"a".repeat(129)).is_err());
    }

    #[test]
    fn bollard_304_maps_to_not_modified() {
        let err = map_bollard_error(
            BollardError::DockerResponseServerError {
                status_code: 304,
                message: String::new(),
            },
            "abc",
            "start container",
        );
        assert!(err.is_not_modified());
    }

    #[test]
    fn bollard_404_maps_to_not_found() {
        let err = map_bollard_error(
            BollardError::DockerResponseServerError {
                status_code: 404,
                message: "no such container".to_owned(),
            },
            "abc",
            "stop container",
        );
        assert!(matches!(err, LifecycleError::ContainerNotFound(id) if id == "abc"));
    }

    #[test]
    fn bollard_500_maps_to_api_error() {
        let err = map_bollard_error(
            BollardError::DockerResponseServerError {
                status_code: 500,
                message: "boom".to_owned(),
            },
            "abc",
            "create container",
        );
        assert!(matches!(err, LifecycleError::RuntimeApi(msg) if msg.contains("create container")));
    }

    #[test]
    fn bollard_timeout_maps_to_connection_error() {
        let err = map_bollard_error(BollardError::RequestTimeoutError, "*", "list containers");
        assert!(matches!(err, LifecycleError::RuntimeConnection(_)));
    }

    #[test]
    fn summary_conversion_strips_slash_and_keeps_ports() {
        use bollard::models::{Port, PortTypeEnum};

        let raw = bollard::models::ContainerSummary {
            id: Some("deadbeef".to_owned()),
            names: Some(vec!["/gameserver-a".to_owned()]),
            image: Some("itzg/minecraft-server".to_owned()),
            state: Some("running".to_owned()),
            ports: Some(vec![Port {
                ip: Some("0.0.0.0".to_owned()),
                private_port: 25565,
                public_port: Some(10001),
                typ: Some(PortTypeEnum::TCP),
            }]),
            ..Default::default()
        };
        let summary = to_summary(raw);
        assert_eq!(summary.name, "gameserver-a");
        assert_eq!(summary.ports[0].public_port, Some(10001));
        assert_eq!(summary.ports[0].protocol, "tcp");
    }

    #[tokio::test]
    async fn mock_lifecycle_transitions() {
        let client = MockRuntimeClient::new();
        let id = client.create_container(&sample_spec("gs-a", 10000)).await.unwrap();
        assert_eq!(client.state_of(&id).as_deref(), Some("created"));

        client.start_container(&id).await.unwrap();
        assert!(client.start_container(&id).await.unwrap_err().is_not_modified());

        client.stop_container(&id).await.unwrap();
        assert!(client.stop_container(&id).await.unwrap_err().is_not_modified());

        client.remove_container(&id).await.unwrap();
        assert!(matches!(
            client.remove_container(&id).await,
            Err(LifecycleError::ContainerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn mock_rejects_duplicate_names() {
        let client = MockRuntimeClient::new();
        client.create_container(&sample_spec("gs-a", 10000)).await.unwrap();
        assert!(client.create_container(&sample_spec("gs-a", 10001)).await.is_err());
    }

    #[tokio::test]
    async fn mock_list_filters_stopped_unless_all() {
        let client = MockRuntimeClient::new();
        let running = client.insert(sample_spec("gs-a", 10000), "running");
        client.insert(sample_spec("gs-b", 10001), "exited");

        let live = client.list_containers(false).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, running);

        assert_eq!(client.list_containers(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn mock_streams_logs_to_sink() {
        let client = MockRuntimeClient::new().with_log_lines(&["Starting", "Done"]);
        let id = client.insert(sample_spec("gs-a", 10000), "running");
        let sink = MemorySink::new();
        client.stream_logs(&id, &sink).await.unwrap();
        assert_eq!(sink.lines(), vec!["Starting", "Done"]);
    }

    #[tokio::test]
    async fn mock_unreachable_fails_ping() {
        let client = MockRuntimeClient::new();
        client.set_unreachable(true);
        assert!(matches!(
            client.ping().await,
            Err(LifecycleError::RuntimeConnection(_))
        ));
    }

    #[test]
    fn runtime_clients_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MockRuntimeClient>();
        assert_send_sync::<BollardRuntimeClient>();
    }
}

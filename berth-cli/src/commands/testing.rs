//! In-memory runtime used by command handler tests.

use std::net::{Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use berth_core::types::{ContainerSummary, PublishedPort};
use berth_lifecycle::{
    ContainerSpec, LifecycleError, LifecycleManager, LifecycleManagerBuilder, ManagerConfigBuilder,
    MemorySink, OutputSink, RuntimeClient,
};
use tempfile::TempDir;
use tokio::sync::Mutex;

struct Entry {
    id: String,
    spec: ContainerSpec,
    state: String,
}

#[derive(Default)]
pub struct FakeRuntime {
    containers: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl FakeRuntime {
    async fn with_entry(
        &self,
        id: &str,
        f: impl FnOnce(&mut Entry) -> Result<(), LifecycleError>,
    ) -> Result<(), LifecycleError> {
        let mut containers = self.containers.lock().await;
        let entry = containers
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| LifecycleError::ContainerNotFound(id.to_owned()))?;
        f(entry)
    }

    fn transition(entry: &mut Entry, to: &str) -> Result<(), LifecycleError> {
        if entry.state == to {
            return Err(LifecycleError::NotModified {
                container_id: entry.id.clone(),
            });
        }
        entry.state = to.to_owned();
        Ok(())
    }
}

impl RuntimeClient for FakeRuntime {
    async fn ping(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, LifecycleError> {
        let id = format!("{:064x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.containers.lock().await.push(Entry {
            id: id.clone(),
            spec: spec.clone(),
            state: "created".to_owned(),
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), LifecycleError> {
        self.with_entry(id, |e| Self::transition(e, "running")).await
    }

    async fn stop_container(&self, id: &str) -> Result<(), LifecycleError> {
        self.with_entry(id, |e| Self::transition(e, "exited")).await
    }

    async fn restart_container(&self, id: &str) -> Result<(), LifecycleError> {
        self.with_entry(id, |e| {
            e.state = "running".to_owned();
            Ok(())
        })
        .await
    }

    async fn remove_container(&self, id: &str) -> Result<(), LifecycleError> {
        let mut containers = self.containers.lock().await;
        let before = containers.len();
        containers.retain(|e| e.id != id);
        if containers.len() == before {
            return Err(LifecycleError::ContainerNotFound(id.to_owned()));
        }
        Ok(())
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, LifecycleError> {
        let containers = self.containers.lock().await;
        Ok(containers
            .iter()
            .filter(|e| all || e.state == "running")
            .map(|e| ContainerSummary {
                id: e.id.clone(),
                name: e.spec.name.clone(),
                image: e.spec.image.clone(),
                state: e.state.clone(),
                ports: vec![PublishedPort {
                    private_port: e.spec.container_port,
                    public_port: (e.state == "running").then_some(e.spec.host_port),
                    protocol: "tcp".to_owned(),
                }],
            })
            .collect())
    }

    async fn stream_logs(&self, _id: &str, sink: &dyn OutputSink) -> Result<(), LifecycleError> {
        sink.write_line("Done! For help, type \"help\"");
        Ok(())
    }
}

pub struct Harness {
    pub root: TempDir,
    pub manager: Arc<LifecycleManager<FakeRuntime>>,
}

pub fn harness() -> Harness {
    let root = TempDir::new().expect("should create temp dir");
    let start_port = {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind ephemeral");
        listener.local_addr().expect("local addr").port()
    };
    let config = ManagerConfigBuilder::new()
        .base_path(root.path())
        .bind_host("127.0.0.1")
        .start_port(start_port)
        .max_port_scan(200)
        .log_stream_timeout_secs(1)
        .build()
        .expect("valid config");
    let manager = LifecycleManagerBuilder::new()
        .config(config)
        .client(Arc::new(FakeRuntime::default()))
        .sink(Arc::new(MemorySink::new()) as Arc<dyn OutputSink>)
        .build()
        .expect("manager should build");
    Harness {
        root,
        manager: Arc::new(manager),
    }
}

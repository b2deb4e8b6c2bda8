//! `berth list` command handler

use std::io::Write;

use serde::Serialize;

use berth_core::types::{ContainerSummary, ServerState};
use berth_lifecycle::{LifecycleManager, RuntimeClient};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub async fn execute<C: RuntimeClient>(
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = run(manager).await?;
    writer.render(&report)
}

pub async fn run<C: RuntimeClient>(manager: &LifecycleManager<C>) -> Result<ListReport, CliError> {
    let container_port = manager.config().container_port;
    let containers = manager.list().await?;
    Ok(ListReport {
        containers: containers
            .iter()
            .map(|c| ContainerRow::new(c, container_port))
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListReport {
    pub containers: Vec<ContainerRow>,
}

#[derive(Debug, Serialize)]
pub struct ContainerRow {
    pub name: String,
    pub id: String,
    pub image: String,
    pub state: String,
    pub server_state: ServerState,
    pub port: Option<u16>,
}

impl ContainerRow {
    fn new(summary: &ContainerSummary, container_port: u16) -> Self {
        let port = summary
            .ports
            .iter()
            .find(|p| p.private_port == container_port)
            .and_then(|p| p.public_port);
        Self {
            name: summary.name.clone(),
            id: summary.id.chars().take(12).collect(),
            image: summary.image.clone(),
            state: summary.state.clone(),
            server_state: summary.server_state(),
            port,
        }
    }
}

impl Render for ListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.containers.is_empty() {
            writeln!(w, "No managed containers.")?;
            return Ok(());
        }

        let name_width = self
            .containers
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(4)
            .max(4);

        writeln!(
            w,
            "{:<name_width$}  {:<12}  {:<7}  {:<9}  {}",
            "NAME", "ID", "STATUS", "STATE", "PORT"
        )?;
        for c in &self.containers {
            let status = match c.server_state {
                ServerState::Online => format!("{:<7}", c.server_state.to_string()).green(),
                ServerState::Offline => format!("{:<7}", c.server_state.to_string()).red(),
            };
            let port = c.port.map(|p| p.to_string()).unwrap_or_else(|| "-".to_owned());
            writeln!(
                w,
                "{:<name_width$}  {:<12}  {}  {:<9}  {}",
                c.name, c.id, status, c.state, port
            )?;
        }
        writeln!(w)?;
        writeln!(w, "{} container(s)", self.containers.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use berth_core::types::PublishedPort;
    use berth_lifecycle::{Action, InstanceSpec};

    use super::*;
    use crate::commands::testing::harness;

    #[tokio::test]
    async fn test_list_reports_port_and_state() {
        let h = harness();
        let a = h
            .manager
            .create(&InstanceSpec::new("paper", "1.20.4"))
            .await
            .expect("create should succeed");
        let b = h
            .manager
            .create(&InstanceSpec::new("paper", "1.20.4"))
            .await
            .expect("create should succeed");
        h.manager
            .apply(Action::Stop, &b.container_name)
            .await
            .expect("stop should succeed");

        let report = run(&*h.manager).await.expect("list should succeed");
        assert_eq!(report.containers.len(), 2);

        let row_a = report
            .containers
            .iter()
            .find(|r| r.name == a.container_name)
            .expect("a listed");
        assert_eq!(row_a.server_state, ServerState::Online);
        assert_eq!(row_a.port, a.port);
        assert_eq!(row_a.id.len(), 12);

        let row_b = report
            .containers
            .iter()
            .find(|r| r.name == b.container_name)
            .expect("b listed");
        assert_eq!(row_b.server_state, ServerState::Offline);
        assert_eq!(row_b.port, None);
    }

    #[test]
    fn test_render_empty() {
        let report = ListReport {
            containers: Vec::new(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        assert!(String::from_utf8(buffer).expect("utf8").contains("No managed containers"));
    }

    #[test]
    fn test_render_table() {
        let summary = ContainerSummary {
            id: "0123456789abcdef".to_owned(),
            name: "gameserver-a".to_owned(),
            image: "itzg/minecraft-server".to_owned(),
            state: "running".to_owned(),
            ports: vec![PublishedPort {
                private_port: 25565,
                public_port: Some(10001),
                protocol: "tcp".to_owned(),
            }],
        };
        let report = ListReport {
            containers: vec![ContainerRow::new(&summary, 25565)],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("utf8");
        assert!(output.contains("NAME"));
        assert!(output.contains("gameserver-a"));
        assert!(output.contains("0123456789ab"));
        assert!(output.contains("10001"));
        assert!(output.contains("1 container(s)"));
    }
}

//! `berth status` command handler

use std::io::Write;

use serde::Serialize;

use berth_core::types::ServerState;
use berth_lifecycle::registry::canonical_name;
use berth_lifecycle::{LifecycleManager, RuntimeClient};

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
pub async fn execute<C: RuntimeClient>(
    args: StatusArgs,
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = run(manager, &args.name).await?;
    writer.render(&report)
}

/// Query ONLINE/OFFLINE. A name with no container is OFFLINE, not an error.
pub async fn run<C: RuntimeClient>(
    manager: &LifecycleManager<C>,
    name: &str,
) -> Result<StatusReport, CliError> {
    let state = manager.state_of(name).await?;
    Ok(StatusReport {
        name: canonical_name(manager.config(), name),
        state,
    })
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub name: String,
    pub state: ServerState,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let state = match self.state {
            ServerState::Online => self.state.to_string().green().bold(),
            ServerState::Offline => self.state.to_string().red().bold(),
        };
        writeln!(w, "{} {}", self.name, state)
    }
}

#[cfg(test)]
mod tests {
    use berth_lifecycle::{Action, InstanceSpec};

    use super::*;
    use crate::commands::testing::harness;

    #[tokio::test]
    async fn test_status_follows_lifecycle() {
        let h = harness();
        let instance = h
            .manager
            .create(&InstanceSpec::new("paper", "1.20.4"))
            .await
            .expect("create should succeed");

        let report = run(&*h.manager, &instance.instance_id.to_string())
            .await
            .expect("status should succeed");
        assert_eq!(report.name, instance.container_name);
        assert_eq!(report.state, ServerState::Online);

        h.manager
            .apply(Action::Stop, &instance.container_name)
            .await
            .expect("stop should succeed");
        let report = run(&*h.manager, &instance.container_name)
            .await
            .expect("status should succeed");
        assert_eq!(report.state, ServerState::Offline);
    }

    #[tokio::test]
    async fn test_status_of_unknown_is_offline() {
        let h = harness();
        let report = run(&*h.manager, "gameserver-nothing")
            .await
            .expect("status should succeed");
        assert_eq!(report.state, ServerState::Offline);
    }

    #[test]
    fn test_status_json() {
        let report = StatusReport {
            name: "gameserver-a".to_owned(),
            state: ServerState::Online,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["state"], "ONLINE");
    }
}

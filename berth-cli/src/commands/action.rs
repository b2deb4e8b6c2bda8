//! `berth start|stop|restart|remove` command handlers

use std::io::Write;

use serde::Serialize;

use berth_lifecycle::{Action, ActionOutcome, LifecycleManager, RuntimeClient};

use crate::cli::TargetArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute a named lifecycle action.
///
/// The report is always rendered. An unknown name or a partially failed
/// wildcard action is then returned as an error so the exit code reflects it.
pub async fn execute<C: RuntimeClient>(
    action: Action,
    args: TargetArgs,
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = run(manager, action, &args.name).await?;
    writer.render(&report)?;
    report.into_result()
}

pub async fn run<C: RuntimeClient>(
    manager: &LifecycleManager<C>,
    action: Action,
    name: &str,
) -> Result<ActionReport, CliError> {
    let outcome = manager.apply(action, name).await?;
    Ok(ActionReport { action, outcome })
}

#[derive(Debug, Serialize)]
pub struct ActionReport {
    pub action: Action,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

impl ActionReport {
    fn into_result(self) -> Result<(), CliError> {
        match self.outcome {
            ActionOutcome::Applied { .. } => Ok(()),
            ActionOutcome::NotFound { name } => Err(CliError::NotFound(name)),
            ActionOutcome::Broadcast { failed, .. } if failed.is_empty() => Ok(()),
            ActionOutcome::Broadcast { failed, .. } => Err(CliError::Command(format!(
                "{} failed for {} instance(s)",
                self.action,
                failed.len()
            ))),
        }
    }
}

fn past_tense(action: Action) -> &'static str {
    match action {
        Action::Start => "started",
        Action::Stop => "stopped",
        Action::Restart => "restarted",
        Action::Remove => "removed",
    }
}

impl Render for ActionReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.outcome {
            ActionOutcome::Applied { name } => {
                writeln!(w, "{} {}", past_tense(self.action).green(), name.bold())?;
            }
            ActionOutcome::NotFound { name } => {
                writeln!(w, "{} no instance named {}", "not found:".yellow(), name.bold())?;
            }
            ActionOutcome::Broadcast { applied, failed } => {
                writeln!(
                    w,
                    "{} {} instance(s)",
                    past_tense(self.action).green(),
                    applied.len()
                )?;
                for name in applied {
                    writeln!(w, "  {name}")?;
                }
                for failure in failed {
                    writeln!(w, "  {}: {}", failure.name.red(), failure.error)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use berth_lifecycle::{BroadcastFailure, InstanceSpec};

    use super::*;
    use crate::commands::testing::harness;

    #[tokio::test]
    async fn test_stop_then_start_applied() {
        let h = harness();
        let instance = h
            .manager
            .create(&InstanceSpec::new("paper", "1.20.4"))
            .await
            .expect("create should succeed");

        let report = run(&*h.manager, Action::Stop, &instance.container_name)
            .await
            .expect("stop should succeed");
        assert!(matches!(report.outcome, ActionOutcome::Applied { .. }));
        assert!(report.into_result().is_ok());

        // already stopped is still success
        let report = run(&*h.manager, Action::Stop, &instance.container_name)
            .await
            .expect("second stop should succeed");
        assert!(matches!(report.outcome, ActionOutcome::Applied { .. }));
    }

    #[tokio::test]
    async fn test_unknown_name_maps_to_not_found() {
        let h = harness();
        let report = run(&*h.manager, Action::Start, "gameserver-missing")
            .await
            .expect("unknown name is not an error at the manager level");
        assert!(report.outcome.is_not_found());

        let err = report.into_result().expect_err("cli should report not found");
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_wildcard_remove_reports_every_instance() {
        let h = harness();
        for _ in 0..2 {
            h.manager
                .create(&InstanceSpec::new("vanilla", "latest"))
                .await
                .expect("create should succeed");
        }

        let report = run(&*h.manager, Action::Remove, "*")
            .await
            .expect("wildcard remove should succeed");
        match &report.outcome {
            ActionOutcome::Broadcast { applied, failed } => {
                assert_eq!(applied.len(), 2);
                assert!(failed.is_empty());
            }
            other => panic!("expected Broadcast, got {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_failure_is_command_error() {
        let report = ActionReport {
            action: Action::Restart,
            outcome: ActionOutcome::Broadcast {
                applied: vec!["gameserver-a".to_owned()],
                failed: vec![BroadcastFailure {
                    name: "gameserver-b".to_owned(),
                    error: "boom".to_owned(),
                }],
            },
        };

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("gameserver-a"));
        assert!(output.contains("boom"));

        let err = report.into_result().expect_err("failures should surface");
        assert!(err.to_string().contains("restart failed for 1 instance(s)"));
    }

    #[test]
    fn test_action_report_json_is_flat() {
        let report = ActionReport {
            action: Action::Stop,
            outcome: ActionOutcome::Applied {
                name: "gameserver-a".to_owned(),
            },
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["action"], "stop");
        assert_eq!(json["outcome"], "applied");
        assert_eq!(json["name"], "gameserver-a");
    }
}

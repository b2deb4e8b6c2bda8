//! `berth create` / `berth recreate` command handlers

use std::io::Write;

use serde::Serialize;

use berth_lifecycle::{InstanceSpec, LifecycleManager, LifecycleState, RuntimeClient, ServerInstance};

use crate::cli::{CreateArgs, RecreateArgs, ServerArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `create` command.
pub async fn execute<C: RuntimeClient>(
    args: CreateArgs,
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let spec = build_spec(&args.server)?;
    let report = create(manager, &spec).await?;
    writer.render(&report)
}

/// Execute the `recreate` command.
pub async fn execute_recreate<C: RuntimeClient>(
    args: RecreateArgs,
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let spec = build_spec(&args.server)?;
    let report = recreate(manager, &args.instance_id, &spec).await?;
    writer.render(&report)
}

pub async fn create<C: RuntimeClient>(
    manager: &LifecycleManager<C>,
    spec: &InstanceSpec,
) -> Result<InstanceReport, CliError> {
    let instance = manager.create(spec).await?;
    Ok(InstanceReport::new("created", &instance))
}

pub async fn recreate<C: RuntimeClient>(
    manager: &LifecycleManager<C>,
    instance_id: &str,
    spec: &InstanceSpec,
) -> Result<InstanceReport, CliError> {
    let instance = manager.recreate_from_directory(instance_id, spec).await?;
    Ok(InstanceReport::new("recreated", &instance))
}

/// Turn positional arguments into an [`InstanceSpec`].
///
/// Platform and version are lower-cased.
pub fn build_spec(args: &ServerArgs) -> Result<InstanceSpec, CliError> {
    let mut spec = InstanceSpec::new(
        args.platform.to_ascii_lowercase(),
        args.version.to_ascii_lowercase(),
    );
    if let Some(memory) = args.memory {
        spec = spec.with_memory(memory);
    }
    if let Some(flags) = &args.flags {
        spec = spec.with_flags(flags)?;
    }
    Ok(spec)
}

/// A freshly provisioned instance.
#[derive(Debug, Serialize)]
pub struct InstanceReport {
    pub operation: &'static str,
    pub name: String,
    pub instance_id: String,
    pub port: Option<u16>,
    pub data_path: String,
    pub state: LifecycleState,
}

impl InstanceReport {
    fn new(operation: &'static str, instance: &ServerInstance) -> Self {
        Self {
            operation,
            name: instance.container_name.clone(),
            instance_id: instance.instance_id.to_string(),
            port: instance.port,
            data_path: instance.data_path.display().to_string(),
            state: instance.state,
        }
    }
}

impl Render for InstanceReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{} {}", self.operation.green().bold(), self.name.bold())?;
        writeln!(w, "  Instance: {}", self.instance_id)?;
        match self.port {
            Some(port) => writeln!(w, "  Port:     {port}")?,
            None => writeln!(w, "  Port:     -")?,
        }
        writeln!(w, "  Data:     {}", self.data_path)?;
        writeln!(w, "  State:    {}", self.state)?;
        Ok(())
    }
}

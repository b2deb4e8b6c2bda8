//! `berth console` -- line-oriented command loop
//!
//! Reads one command per line, parses it into a [`ConsoleCommand`], and
//! dispatches to the same handlers the one-shot subcommands use. Errors are
//! printed and the loop continues; `exit`, EOF, or Ctrl-C end it.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use berth_lifecycle::{LifecycleManager, RuntimeClient};

use crate::cli::ConsoleArgs;
use crate::command::{ConsoleCommand, HELP};
use crate::commands::{action, create, list, status};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const PROMPT: &str = "berth »";

/// Execute the `console` command on stdin/stdout.
pub async fn execute<C: RuntimeClient>(
    args: ConsoleArgs,
    manager: Arc<LifecycleManager<C>>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let reconciler = manager
        .config()
        .reconcile_interval()
        .map(|interval| manager.spawn_reconciler(interval));

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = run(&*manager, writer, stdin, &mut stdout, !args.no_prompt).await;

    manager.shutdown().await;
    if let Some(handle) = reconciler {
        // shutdown already signalled through the token
        let _ = handle.await;
    }
    result.map(|_| ())
}

/// Control flow after one console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Run the command loop until `exit`, end of input, or Ctrl-C.
///
/// Returns the number of commands that were dispatched.
pub async fn run<C, R>(
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
    input: R,
    out: &mut dyn Write,
    prompt: bool,
) -> Result<usize, CliError>
where
    C: RuntimeClient,
    R: AsyncBufRead + Unpin,
{
    use colored::Colorize;

    let mut lines = input.lines();
    let mut dispatched = 0;

    loop {
        if prompt {
            write!(out, "{} ", PROMPT.cyan())?;
            out.flush()?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                writeln!(out)?;
                None
            }
        };
        let Some(line) = line else {
            debug!("console input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match ConsoleCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e.to_string().red())?;
                continue;
            }
        };

        dispatched += 1;
        match dispatch(manager, writer, out, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => writeln!(out, "{} {}", "error:".red().bold(), e)?,
        }
    }

    info!(commands = dispatched, "console stopped");
    writeln!(out, "Stopping console...")?;
    Ok(dispatched)
}

/// Execute one parsed console command, rendering its result to `out`.
pub async fn dispatch<C: RuntimeClient>(
    manager: &LifecycleManager<C>,
    writer: &OutputWriter,
    out: &mut dyn Write,
    command: ConsoleCommand,
) -> Result<Flow, CliError> {
    match command {
        ConsoleCommand::Create(spec) => {
            let report = create::create(manager, &spec).await?;
            writer.render_to(out, &report)?;
        }
        ConsoleCommand::Recreate { instance_id, spec } => {
            let report = create::recreate(manager, &instance_id, &spec).await?;
            writer.render_to(out, &report)?;
        }
        ConsoleCommand::Apply { action, name } => {
            // unknown names are not errors in the console
            let report = action::run(manager, action, &name).await?;
            writer.render_to(out, &report)?;
        }
        ConsoleCommand::List => {
            let report = list::run(manager).await?;
            writer.render_to(out, &report)?;
        }
        ConsoleCommand::Status(name) => {
            let report = status::run(manager, &name).await?;
            writer.render_to(out, &report)?;
        }
        ConsoleCommand::Clear => {
            write!(out, "\x1b[2J\x1b[H")?;
            out.flush()?;
        }
        ConsoleCommand::Help => writer.render_to(out, &HelpReport::new())?,
        ConsoleCommand::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

#[derive(Debug, Serialize)]
pub struct HelpReport {
    pub commands: Vec<HelpEntry>,
}

#[derive(Debug, Serialize)]
pub struct HelpEntry {
    pub usage: &'static str,
    pub description: &'static str,
}

impl HelpReport {
    fn new() -> Self {
        Self {
            commands: HELP
                .iter()
                .map(|&(usage, description)| HelpEntry { usage, description })
                .collect(),
        }
    }
}

impl Render for HelpReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let width = self.commands.iter().map(|c| c.usage.len()).max().unwrap_or(0);
        writeln!(w, "{}", "Commands".bold())?;
        for entry in &self.commands {
            writeln!(
                w,
                "  {}  {}",
                format!("{:<width$}", entry.usage).cyan(),
                entry.description
            )?;
        }
        writeln!(w)?;
        writeln!(w, "<name> is a container name or a bare instance id; flags are KEY=VALUE;KEY=VALUE")?;
        Ok(())
    }
}

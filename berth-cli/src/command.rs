//! Console line parsing
//!
//! Each console line is parsed once into a [`ConsoleCommand`]; dispatch then
//! matches on the enum. Tokens are separated by whitespace, so `flags`
//! (`KEY=VALUE;KEY=VALUE`) must not contain spaces.

use berth_lifecycle::{Action, InstanceSpec};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `create <platform> <version> [memory] [flags]`
    Create(InstanceSpec),
    /// `recreate <instanceId> <platform> <version> [memory] [flags]`
    Recreate {
        instance_id: String,
        spec: InstanceSpec,
    },
    /// `start|stop|restart|remove <name|*>`
    Apply { action: Action, name: String },
    /// `list`
    List,
    /// `status <name>`
    Status(String),
    /// `clear`
    Clear,
    /// `help`
    Help,
    /// `exit`, `shutdown`, or a bare `stop`
    Exit,
}

/// Reasons a console line could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("the input can not be empty")]
    Empty,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid memory value '{0}', expected megabytes")]
    InvalidMemory(String),

    #[error("{0}")]
    InvalidFlags(String),
}

const CREATE_USAGE: &str = "create <platform> <version> [memory] [flags]";
const RECREATE_USAGE: &str = "recreate <instanceId> <platform> <version> [memory] [flags]";
const STATUS_USAGE: &str = "status <name>";

/// `help` output, one line per command.
pub const HELP: &[(&str, &str)] = &[
    (CREATE_USAGE, "create a server on the next free port"),
    (RECREATE_USAGE, "recreate the container for an existing data directory"),
    ("start <name|*>", "start an instance"),
    ("stop <name|*>", "stop an instance"),
    ("restart <name|*>", "restart an instance"),
    ("remove <name|*>", "remove an instance's container, keeping its data"),
    ("list", "list managed containers"),
    (STATUS_USAGE, "show ONLINE/OFFLINE for an instance"),
    ("clear", "clear the screen"),
    ("exit, shutdown", "stop the console"),
    ("help", "show this help"),
];

impl ConsoleCommand {
    /// Parse one console line.
    ///
    /// The long forms `create-container`/`create-con` (and likewise for the
    /// other lifecycle verbs) and `list-containers`/`list-cons` are accepted as
    /// aliases.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Err(ParseError::Empty);
        };
        let args: Vec<&str> = tokens.collect();
        let lowered = verb.to_ascii_lowercase();
        let verb = lowered
            .strip_suffix("-container")
            .or_else(|| lowered.strip_suffix("-con"))
            .unwrap_or(lowered.as_str());

        match verb {
            "create" => parse_spec(&args, CREATE_USAGE).map(Self::Create),
            "recreate" => {
                let Some((instance_id, rest)) = args.split_first() else {
                    return Err(ParseError::Usage(RECREATE_USAGE));
                };
                let spec = parse_spec(rest, RECREATE_USAGE)?;
                Ok(Self::Recreate {
                    instance_id: (*instance_id).to_owned(),
                    spec,
                })
            }
            // bare `stop` leaves the console
            "stop" if args.is_empty() => Ok(Self::Exit),
            "start" | "stop" | "restart" | "remove" => {
                let action = match verb {
                    "start" => Action::Start,
                    "stop" => Action::Stop,
                    "restart" => Action::Restart,
                    _ => Action::Remove,
                };
                match args.as_slice() {
                    [name] => Ok(Self::Apply {
                        action,
                        name: (*name).to_owned(),
                    }),
                    _ => Err(ParseError::Usage(action_usage(action))),
                }
            }
            "list" | "list-containers" | "list-cons" => Ok(Self::List),
            "status" => match args.as_slice() {
                [name] => Ok(Self::Status((*name).to_owned())),
                _ => Err(ParseError::Usage(STATUS_USAGE)),
            },
            "clear" => Ok(Self::Clear),
            "help" | "?" => Ok(Self::Help),
            "exit" | "quit" | "shutdown" => Ok(Self::Exit),
            _ => Err(ParseError::Unknown(verb.to_owned())),
        }
    }
}

fn action_usage(action: Action) -> &'static str {
    match action {
        Action::Start => "start <name|*>",
        Action::Stop => "stop <name|*>",
        Action::Restart => "restart <name|*>",
        Action::Remove => "remove <name|*>",
    }
}

/// `<platform> <version> [memory] [flags]`
fn parse_spec(args: &[&str], usage: &'static str) -> Result<InstanceSpec, ParseError> {
    let (platform, version, rest) = match args {
        [platform, version, rest @ ..] if rest.len() <= 2 => (platform, version, rest),
        _ => return Err(ParseError::Usage(usage)),
    };

    let mut spec = InstanceSpec::new(platform.to_ascii_lowercase(), version.to_ascii_lowercase());
    if let Some(memory) = rest.first() {
        let memory_mb = memory
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidMemory((*memory).to_owned()))?;
        spec = spec.with_memory(memory_mb);
    }
    if let Some(flags) = rest.get(1) {
        spec = spec
            .with_flags(flags)
            .map_err(|e| ParseError::InvalidFlags(e.to_string()))?;
    }
    Ok(spec)
}

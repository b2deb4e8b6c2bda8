//! CLI-specific error types and exit code mapping

use berth_core::error::BerthError;
use berth_lifecycle::LifecycleError;

use crate::command::ParseError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The container runtime could not be reached.
    #[error("container runtime not reachable: {0}")]
    RuntimeUnavailable(String),

    /// No managed instance matched the requested name.
    #[error("no instance named '{0}'")]
    NotFound(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from berth-core.
    #[error("{0}")]
    Core(#[from] BerthError),

    /// Lifecycle manager error.
    #[error("{0}")]
    Lifecycle(LifecycleError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command error              |
    /// | 2    | Configuration error                  |
    /// | 3    | Container runtime unreachable        |
    /// | 4    | Instance not found                   |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(BerthError::Config(_)) => 2,
            Self::RuntimeUnavailable(_) => 3,
            Self::NotFound(_) => 4,
            Self::Io(_) | Self::Core(BerthError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Lifecycle(_) => 1,
        }
    }
}

impl From<LifecycleError> for CliError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::RuntimeConnection(msg) => Self::RuntimeUnavailable(msg),
            config @ LifecycleError::Config { .. } => Self::Config(config.to_string()),
            other => Self::Lifecycle(other),
        }
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        Self::Command(e.to_string())
    }
}

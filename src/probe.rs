//! Environment manager detection
//!
//! The installer only proceeds when the environment manager (conda by
//! default) can be launched. The probe runs the executable with no
//! arguments, a null stdin and its stdout discarded. Only the launch matters: a tool that
//! starts and exits non-zero still counts as installed, while any launch
//! or wait error counts as absent.

use crate::runner::{CommandRunner, InputMode, OutputMode};
use crate::tool_args::ToolArgs;
use tracing::{debug, info};

/// Arguments for probing the environment manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeArgs {
    pub executable: String,
}

impl ToolArgs for ProbeArgs {
    fn program(&self) -> &str {
        &self.executable
    }

    fn to_cli_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Null
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Discard
    }

    fn is_destructive(&self) -> bool {
        false
    }
}

/// Checks whether the environment manager is available
#[derive(Debug, Clone)]
pub struct EnvironmentProbe {
    args: ProbeArgs,
}

impl EnvironmentProbe {
    /// Probe for `executable`, resolved through `PATH`
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            args: ProbeArgs {
                executable: executable.into(),
            },
        }
    }

    /// The executable being probed
    pub fn executable(&self) -> &str {
        &self.args.executable
    }

    /// True if the executable could be launched and waited for
    pub fn is_available<R: CommandRunner>(&self, runner: &R) -> bool {
        match runner.run(&self.args.invocation()) {
            Ok(outcome) => {
                info!(
                    manager = %self.args.executable,
                    exit_code = ?outcome.exit_code,
                    "environment manager detected"
                );
                true
            }
            Err(e) => {
                debug!(manager = %self.args.executable, error = %e, "environment manager probe failed");
                false
            }
        }
    }

    /// Operator-facing message printed when the probe fails
    pub fn missing_message(&self) -> String {
        format!(
            "***No {} installation detected. Please install.",
            self.args.executable
        )
    }
}

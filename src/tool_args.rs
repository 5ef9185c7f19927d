//! Typed arguments for the external tools the installer drives.
//!
//! Each subprocess (environment probe, dependency install, packaging) has
//! a struct implementing `ToolArgs`. The struct is the contract: it decides
//! the program, its arguments, its environment and where its stdin and
//! stdout go, and `invocation()` turns that into something a `CommandRunner`
//! can execute.

use crate::runner::{InputMode, Invocation, OutputMode};

/// Trait for typed tool arguments.
///
/// # Contract
///
/// - `program()`: executable name or path, resolved through `PATH`.
/// - `to_cli_args()`: arguments exactly as the tool expects them.
/// - `get_env_vars()`: extra environment for the tool; the installer's own
///   environment is inherited.
pub trait ToolArgs {
    fn program(&self) -> &str;

    fn to_cli_args(&self) -> Vec<String>;

    fn get_env_vars(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Interactive tools keep the operator's stdin
    fn input_mode(&self) -> InputMode {
        InputMode::Inherit
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Inherit
    }

    /// Whether the tool changes the system. Dry-run skips destructive
    /// tools and still runs the rest.
    fn is_destructive(&self) -> bool {
        true
    }

    /// Build the runnable invocation
    fn invocation(&self) -> Invocation {
        Invocation {
            program: self.program().to_string(),
            args: self.to_cli_args(),
            env: self.get_env_vars(),
            stdin: self.input_mode(),
            stdout: self.output_mode(),
            destructive: self.is_destructive(),
        }
    }
}

/// Split a configured command line into program and leading args
pub(crate) fn split_command(command: &[String]) -> (&str, &[String]) {
    match command.split_first() {
        Some((program, rest)) => (program.as_str(), rest),
        None => ("", &[]),
    }
}

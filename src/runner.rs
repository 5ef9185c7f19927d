//! Subprocess execution
//!
//! `SystemRunner` is the only place that spawns processes. Every child:
//!
//! - is registered with `ChildRegistry::global()` while it runs
//! - receives SIGTERM if the installer dies (Linux)
//!
//! Children with a null stdin (the probe) run in their own process group.
//! Children that share the operator's stdin (dependency installs, the
//! packager) stay in the installer's group so they can prompt on the
//! terminal without being stopped by SIGTTIN.
//!
//! The runner waits for each child and reports how it ended. Whether a
//! non-zero exit matters is the caller's decision.

use crate::error::{Result, SetupError};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::fmt;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Where a child's stdout goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Share the installer's stdout
    #[default]
    Inherit,
    /// Send to /dev/null
    Discard,
}

/// Where a child's stdin comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Share the installer's stdin; the child stays in the foreground group
    #[default]
    Inherit,
    /// Read from /dev/null; the child leads its own process group
    Null,
}

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: InputMode,
    pub stdout: OutputMode,
    /// Skipped in dry-run mode
    pub destructive: bool,
}

impl Invocation {
    /// Invocation of `program` with no arguments, sharing stdin and stdout
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: InputMode::Inherit,
            stdout: OutputMode::Inherit,
            destructive: true,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a finished child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code (None if terminated by signal, or in dry-run mode)
    pub exit_code: Option<i32>,
    pub success: bool,
    /// The command was logged instead of executed
    pub dry_run: bool,
}

impl CommandOutcome {
    /// Outcome of a child that exited with `code`
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            success: code == 0,
            dry_run: false,
        }
    }

    /// Outcome of a command that was only logged
    pub fn dry_run() -> Self {
        Self {
            exit_code: None,
            success: true,
            dry_run: true,
        }
    }

    /// Process exit status to propagate. Signal deaths map to 1.
    pub fn exit_status(&self) -> i32 {
        match (self.dry_run, self.exit_code) {
            (true, _) => 0,
            (false, Some(code)) => code,
            (false, None) => 1,
        }
    }
}

/// Executes invocations.
///
/// `Err` means the child could not be started or waited for; a child that
/// ran and failed is an `Ok` outcome with `success == false`.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutcome>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        (**self).run(invocation)
    }
}

/// Runs invocations as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner {
    dry_run: bool,
}

impl SystemRunner {
    /// Runner that spawns everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Log destructive invocations instead of spawning them
    pub fn dry_run(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Whether destructive invocations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        if self.dry_run && invocation.destructive {
            info!(command = %invocation, "[dry-run] would execute");
            return Ok(CommandOutcome::dry_run());
        }

        debug!(command = %invocation, env = ?invocation.env, "spawning");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)));
        let own_group = match invocation.stdin {
            InputMode::Null => {
                cmd.stdin(Stdio::null()).in_new_process_group();
                true
            }
            InputMode::Inherit => {
                cmd.with_parent_death_signal();
                false
            }
        };
        if invocation.stdout == OutputMode::Discard {
            cmd.stdout(Stdio::null());
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| SetupError::spawn(&invocation.program, e))?;
        let pid = child.id();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid, own_group);
        }

        let status = child.wait();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        let status = status.map_err(|e| SetupError::spawn(&invocation.program, e))?;

        let outcome = CommandOutcome {
            exit_code: status.code(),
            success: status.success(),
            dry_run: false,
        };
        debug!(command = %invocation, exit_code = ?outcome.exit_code, "finished");
        Ok(outcome)
    }
}

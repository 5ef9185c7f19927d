//! Package registration
//!
//! Hands control to the packaging subsystem: the configured packager
//! command (`python3 setup.py` by default) followed by whatever arguments
//! the installer was given after its own options. Those arguments are
//! never inspected here; the packager decides whether they mean build,
//! install, sdist or anything else. Package metadata is passed through the
//! environment (see `PackageMetadata::to_env_vars`).

use crate::error::Result;
use crate::metadata::PackageMetadata;
use crate::runner::{CommandOutcome, CommandRunner};
use crate::tool_args::{split_command, ToolArgs};
use tracing::info;

/// Arguments for the packager invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingArgs<'a> {
    pub command: &'a [String],
    pub metadata: &'a PackageMetadata,
    pub passthrough: &'a [String],
}

impl ToolArgs for PackagingArgs<'_> {
    fn program(&self) -> &str {
        split_command(self.command).0
    }

    fn to_cli_args(&self) -> Vec<String> {
        let (_, leading) = split_command(self.command);
        leading.iter().chain(self.passthrough).cloned().collect()
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        self.metadata.to_env_vars()
    }
}

/// Run the packager and return how it ended.
///
/// Only a launch failure is an error; the packager's own exit status is
/// returned for the caller to propagate.
pub fn register_package<R: CommandRunner>(
    runner: &R,
    command: &[String],
    metadata: &PackageMetadata,
    passthrough: &[String],
) -> Result<CommandOutcome> {
    let args = PackagingArgs {
        command,
        metadata,
        passthrough,
    };
    let invocation = args.invocation();

    info!(
        package = %metadata.name,
        version = %metadata.version,
        command = %invocation,
        "registering package"
    );

    let outcome = runner.run(&invocation)?;

    info!(
        package = %metadata.name,
        exit_code = ?outcome.exit_code,
        "packager finished"
    );
    Ok(outcome)
}

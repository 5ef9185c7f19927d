//! Requirements artifact and per-dependency installation
//!
//! The requirements file is one identifier per line. Lines are taken
//! verbatim apart from the line terminator; blank lines are skipped. No
//! version parsing and no deduplication happen here, the package installer
//! sees exactly what the file says.
//!
//! Installation runs the configured installer once per identifier. A
//! failing install never stops the loop; failures are collected in a
//! `DependencyReport` for the caller to log.

use crate::config::InstallerConfig;
use crate::error::{Result, SetupError};
use crate::filesystem::FileSystem;
use crate::runner::CommandRunner;
use crate::tool_args::{split_command, ToolArgs};
use tracing::{info, warn};

/// Ordered dependency identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    entries: Vec<String>,
}

impl Requirements {
    /// Parse requirements text
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    /// Read and parse the configured requirements artifact
    pub fn load<F: FileSystem>(fs: &F, config: &InstallerConfig) -> Result<Self> {
        let path = config.requirements_path();
        let text = fs
            .read_to_string(&path)
            .map_err(|source| SetupError::Requirements { path, source })?;
        Ok(Self::parse(&text))
    }

    /// Identifiers in file order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there is nothing to install
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Requirements {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Arguments for installing a single dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInstallArgs<'a> {
    /// Installer program and its leading args, e.g. `pip install`
    pub command: &'a [String],
    pub requirement: &'a str,
}

impl ToolArgs for DependencyInstallArgs<'_> {
    fn program(&self) -> &str {
        split_command(self.command).0
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = split_command(self.command).1.to_vec();
        args.push(self.requirement.to_string());
        args
    }
}

/// What happened to one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyFailure {
    /// The installer ran and exited unsuccessfully
    Exited {
        requirement: String,
        exit_code: Option<i32>,
    },
    /// The installer could not be launched
    NotLaunched { requirement: String, error: String },
}

impl DependencyFailure {
    /// The identifier that failed
    pub fn requirement(&self) -> &str {
        match self {
            Self::Exited { requirement, .. } | Self::NotLaunched { requirement, .. } => {
                requirement
            }
        }
    }
}

/// Summary of a dependency installation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub attempted: usize,
    pub failed: Vec<DependencyFailure>,
}

impl DependencyReport {
    /// True if no install failed
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Identifiers of the failed installs, in order
    pub fn failed_requirements(&self) -> Vec<&str> {
        self.failed.iter().map(DependencyFailure::requirement).collect()
    }
}

/// Install every requirement, one subprocess each, in order
pub fn install_dependencies<R: CommandRunner>(
    runner: &R,
    installer: &[String],
    requirements: &Requirements,
) -> DependencyReport {
    let mut report = DependencyReport::default();

    for requirement in requirements.iter() {
        let args = DependencyInstallArgs {
            command: installer,
            requirement,
        };
        let invocation = args.invocation();
        report.attempted += 1;

        match runner.run(&invocation) {
            Ok(outcome) if outcome.success => {
                info!(requirement, "dependency installed");
            }
            Ok(outcome) => {
                warn!(requirement, exit_code = ?outcome.exit_code, "dependency install failed, continuing");
                report.failed.push(DependencyFailure::Exited {
                    requirement: requirement.to_string(),
                    exit_code: outcome.exit_code,
                });
            }
            Err(e) => {
                warn!(requirement, error = %e, "dependency installer did not start, continuing");
                report.failed.push(DependencyFailure::NotLaunched {
                    requirement: requirement.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    if !report.all_succeeded() {
        warn!(
            attempted = report.attempted,
            failed = ?report.failed_requirements(),
            "some dependencies failed to install"
        );
    }

    report
}

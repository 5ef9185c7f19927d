//! pkgsetup library
//!
//! Installation workflow for a data-analysis package: environment manager
//! probe, data artifact staging, per-requirement dependency installs and
//! hand-off to the packager.

pub mod cli;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod installer;
pub mod metadata;
pub mod packaging;
pub mod probe;
pub mod process_guard;
pub mod requirements;
pub mod runner;
pub mod staging;
pub mod tool_args;

// Re-export main types for convenience
pub use config::InstallerConfig;
pub use error::{Result, SetupError};
pub use filesystem::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use installer::{InstallOutcome, InstallStep, Installer};
pub use metadata::PackageMetadata;
pub use probe::EnvironmentProbe;
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use requirements::{DependencyFailure, DependencyReport, Requirements};
pub use runner::{CommandOutcome, CommandRunner, InputMode, Invocation, OutputMode, SystemRunner};
pub use staging::StagedArtifact;
pub use tool_args::ToolArgs;

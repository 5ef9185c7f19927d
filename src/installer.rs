//! Installer module
//!
//! Runs the setup workflow in a fixed order:
//!
//! 1. probe for the environment manager; stop quietly if it is missing
//! 2. stage the data artifact (fatal on error)
//! 3. install each requirement (individual failures are reported, never fatal)
//! 4. hand over to the packager
//!
//! Nothing is rolled back and nothing runs in parallel.

use crate::config::InstallerConfig;
use crate::error::Result;
use crate::filesystem::FileSystem;
use crate::packaging::register_package;
use crate::probe::EnvironmentProbe;
use crate::requirements::{install_dependencies, DependencyReport, Requirements};
use crate::runner::{CommandOutcome, CommandRunner};
use crate::staging::{stage_data_file, StagedArtifact};
use std::io::Write;
use strum::{Display, EnumIter};
use tracing::{info, info_span};

/// Workflow steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum InstallStep {
    ProbeEnvironment,
    StageData,
    InstallDependencies,
    RegisterPackage,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The environment manager was not found; nothing else ran
    EnvironmentMissing { message: String },
    /// All steps ran
    Completed {
        staged: StagedArtifact,
        dependencies: DependencyReport,
        packaging: CommandOutcome,
    },
}

impl InstallOutcome {
    /// Process exit status for this outcome
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::EnvironmentMissing { .. } => 0,
            Self::Completed { packaging, .. } => packaging.exit_status(),
        }
    }
}

/// Installer instance
pub struct Installer<F, R> {
    config: InstallerConfig,
    fs: F,
    runner: R,
    passthrough: Vec<String>,
    dry_run: bool,
}

impl<F: FileSystem, R: CommandRunner> Installer<F, R> {
    /// Installer over `fs` and `runner` with no passthrough arguments
    pub fn new(config: InstallerConfig, fs: F, runner: R) -> Self {
        Self {
            config,
            fs,
            runner,
            passthrough: Vec::new(),
            dry_run: false,
        }
    }

    /// Arguments forwarded untouched to the packager
    pub fn with_passthrough(mut self, args: Vec<String>) -> Self {
        self.passthrough = args;
        self
    }

    /// Verify the artifact but skip writes during staging
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Configuration this installer runs with
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Run the workflow, printing the missing-manager notice to stdout
    pub fn run(&self) -> Result<InstallOutcome> {
        self.run_with_output(&mut std::io::stdout())
    }

    /// Run the workflow, writing the missing-manager notice to `out`
    pub fn run_with_output<W: Write>(&self, out: &mut W) -> Result<InstallOutcome> {
        let probe = EnvironmentProbe::new(&self.config.environment_manager);

        let available = {
            let _span = info_span!("install", step = %InstallStep::ProbeEnvironment).entered();
            probe.is_available(&self.runner)
        };
        if !available {
            let message = probe.missing_message();
            writeln!(out, "{}", message)?;
            return Ok(InstallOutcome::EnvironmentMissing { message });
        }

        let staged = {
            let _span = info_span!("install", step = %InstallStep::StageData).entered();
            stage_data_file(&self.fs, &self.config, self.dry_run)?
        };

        let dependencies = {
            let _span = info_span!("install", step = %InstallStep::InstallDependencies).entered();
            let requirements = Requirements::load(&self.fs, &self.config)?;
            info!(count = requirements.len(), "installing dependencies");
            install_dependencies(
                &self.runner,
                &self.config.dependency_installer,
                &requirements,
            )
        };

        let packaging = {
            let _span = info_span!("install", step = %InstallStep::RegisterPackage).entered();
            register_package(
                &self.runner,
                &self.config.packager,
                &self.config.metadata,
                &self.passthrough,
            )?
        };

        Ok(InstallOutcome::Completed {
            staged,
            dependencies,
            packaging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use crate::filesystem::MemoryFileSystem;
    use crate::runner::Invocation;
    use std::sync::Mutex;
    use strum::IntoEnumIterator;

    /// Records invocations; the probe fails when `probe_ok` is false
    struct ScriptedRunner {
        probe_ok: bool,
        calls: Mutex<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        fn new(probe_ok: bool) -> Self {
            Self {
                probe_ok,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.program.clone())
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
            self.calls.lock().unwrap().push(invocation.clone());
            if invocation.program == "conda" && !self.probe_ok {
                return Err(SetupError::spawn(
                    "conda",
                    std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                ));
            }
            Ok(CommandOutcome::exited(0))
        }
    }

    fn project_fs() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_dir("/work/microbepy")
            .with_file("/work/Data/data_model/microbepy.db", vec![1, 2, 3])
            .with_file("/work/requirements.txt", "numpy\npandas\n")
    }

    #[test]
    fn test_steps_are_ordered() {
        let names: Vec<String> = InstallStep::iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "probe_environment",
                "stage_data",
                "install_dependencies",
                "register_package"
            ]
        );
    }

    #[test]
    fn test_full_run_order() {
        let runner = ScriptedRunner::new(true);
        let installer = Installer::new(
            InstallerConfig::default().with_root("/work"),
            project_fs(),
            &runner,
        );

        let mut out = Vec::new();
        let outcome = installer.run_with_output(&mut out).unwrap();

        assert_eq!(outcome.exit_status(), 0);
        assert!(out.is_empty());
        assert_eq!(runner.programs(), vec!["conda", "pip", "pip", "python3"]);
    }

    #[test]
    fn test_missing_manager_stops_everything() {
        let runner = ScriptedRunner::new(false);
        let fs = project_fs();
        let installer = Installer::new(InstallerConfig::default().with_root("/work"), &fs, &runner);

        let mut out = Vec::new();
        let outcome = installer.run_with_output(&mut out).unwrap();

        assert!(matches!(outcome, InstallOutcome::EnvironmentMissing { .. }));
        assert_eq!(outcome.exit_status(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "***No conda installation detected. Please install.\n"
        );
        assert_eq!(runner.programs(), vec!["conda"]);
        assert_eq!(fs.contents("/work/microbepy/data_base/microbepy.db"), None);
    }

    #[test]
    fn test_passthrough_reaches_packager() {
        let runner = ScriptedRunner::new(true);
        let installer = Installer::new(
            InstallerConfig::default().with_root("/work"),
            project_fs(),
            &runner,
        )
        .with_passthrough(vec!["sdist".to_string()]);

        installer.run_with_output(&mut Vec::new()).unwrap();

        let calls = runner.calls.lock().unwrap();
        let packager = calls.last().unwrap();
        assert_eq!(packager.args, vec!["setup.py", "sdist"]);
    }
}

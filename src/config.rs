//! Installer configuration.
//!
//! Every well-known name the installer touches (project name, data
//! directories, tool executables) lives here so nothing is read from
//! ambient process state once the config is built. The on-disk format is
//! JSON; missing keys fall back to the built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::metadata::PackageMetadata;

/// Installer configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Project root. Never serialized; set from `--root` or the cwd.
    #[serde(skip)]
    pub root: PathBuf,

    /// Project name; also the package directory and the artifact stem
    pub project_name: String,
    /// Directory inside the package that receives the artifact
    pub data_dir: String,
    /// Directory (relative to root) holding the bundled artifact
    pub artifact_dir: PathBuf,
    /// Requirements artifact, relative to root
    pub requirements_file: PathBuf,

    /// Executable whose presence gates the whole run
    pub environment_manager: String,
    /// Program and leading args; the requirement identifier is appended
    pub dependency_installer: Vec<String>,
    /// Program and leading args; passthrough args are appended
    pub packager: Vec<String>,

    pub metadata: PackageMetadata,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            project_name: "microbepy".to_string(),
            data_dir: "data_base".to_string(),
            artifact_dir: PathBuf::from("Data").join("data_model"),
            requirements_file: PathBuf::from("requirements.txt"),
            environment_manager: "conda".to_string(),
            dependency_installer: vec!["pip".to_string(), "install".to_string()],
            packager: vec!["python3".to_string(), "setup.py".to_string()],
            metadata: PackageMetadata::default(),
        }
    }
}

impl InstallerConfig {
    /// Return a copy rooted at `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// File name of the data artifact (`<project>.db`)
    pub fn artifact_file_name(&self) -> String {
        format!("{}.db", self.project_name)
    }

    /// `<root>/<artifact_dir>/<project>.db`
    pub fn source_artifact(&self) -> PathBuf {
        self.root
            .join(&self.artifact_dir)
            .join(self.artifact_file_name())
    }

    /// `<root>/<project>/<data_dir>`
    pub fn destination_dir(&self) -> PathBuf {
        self.root.join(&self.project_name).join(&self.data_dir)
    }

    /// `<root>/<project>/<data_dir>/<project>.db`
    pub fn destination_artifact(&self) -> PathBuf {
        self.destination_dir().join(self.artifact_file_name())
    }

    /// `<root>/<requirements_file>`
    pub fn requirements_path(&self) -> PathBuf {
        self.root.join(&self.requirements_file)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Pretty JSON rendering, as written by `save_to_file`
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration to JSON")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let project = self.project_name.trim();
        if project.is_empty() {
            anyhow::bail!("Project name must be specified");
        }
        if project.contains(['/', '\\']) || project == "." || project == ".." {
            anyhow::bail!("Project name must be a single path component: {:?}", project);
        }

        if self.data_dir.trim().is_empty() {
            anyhow::bail!("Data directory must be specified");
        }

        if self.environment_manager.trim().is_empty() {
            anyhow::bail!("Environment manager executable must be specified");
        }

        if self.dependency_installer.first().is_none_or(|p| p.trim().is_empty()) {
            anyhow::bail!("Dependency installer command must name a program");
        }

        if self.packager.first().is_none_or(|p| p.trim().is_empty()) {
            anyhow::bail!("Packager command must name a program");
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("Package metadata must include a name");
        }

        Ok(())
    }
}

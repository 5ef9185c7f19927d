use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::InstallerConfig;

/// pkgsetup - stage data, install dependencies and hand over to the packager
///
/// `--help` and `--version` belong to the packager, so the installer's own
/// help lives behind `--installer-help` and there is no version flag.
#[derive(Parser, Debug)]
#[command(name = "pkgsetup")]
#[command(about = "Set up a data-analysis package: stage its database, install requirements, run the packager")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Print this help and exit
    #[arg(long, action = clap::ArgAction::Help)]
    pub installer_help: Option<bool>,

    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// The environment manager probe still runs and the data artifact is
    /// still checked; copying, dependency installs and the packager are
    /// only logged.
    #[arg(long)]
    pub dry_run: bool,

    /// JSON configuration file (defaults are built in)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub show_config: bool,

    /// Arguments for the packager, passed through untouched
    /// (e.g. `build`, `install --user`, `sdist`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub packager_args: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build and validate the configuration this invocation asks for
    pub fn resolve_config(&self) -> Result<InstallerConfig> {
        let config = match &self.config {
            Some(path) => InstallerConfig::load_from_file(path)?,
            None => InstallerConfig::default(),
        };

        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let config = config.with_root(root);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["pkgsetup"]).unwrap();
        assert!(!cli.dry_run);
        assert!(cli.packager_args.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_passthrough_is_untouched() {
        let cli =
            Cli::try_parse_from(["pkgsetup", "--dry-run", "install", "--user", "--dry-run"])
                .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.packager_args, vec!["install", "--user", "--dry-run"]);
    }

    #[test]
    fn test_double_dash_passthrough() {
        let cli = Cli::try_parse_from(["pkgsetup", "--", "--help"]).unwrap();
        assert_eq!(cli.packager_args, vec!["--help"]);
    }

    #[test]
    fn test_help_and_version_reach_packager() {
        let cli = Cli::try_parse_from(["pkgsetup", "--version"]).unwrap();
        assert_eq!(cli.packager_args, vec!["--version"]);

        let cli = Cli::try_parse_from(["pkgsetup", "--help"]).unwrap();
        assert_eq!(cli.packager_args, vec!["--help"]);

        let cli = Cli::try_parse_from(["pkgsetup", "--dry-run", "-h"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.packager_args, vec!["-h"]);
    }

    #[test]
    fn test_installer_help_flag() {
        let err = Cli::try_parse_from(["pkgsetup", "--installer-help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_show_config_flag() {
        let cli = Cli::try_parse_from(["pkgsetup", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.packager_args.is_empty());

        // Without the dashes it is a packager command like any other
        let cli = Cli::try_parse_from(["pkgsetup", "show-config"]).unwrap();
        assert!(!cli.show_config);
        assert_eq!(cli.packager_args, vec!["show-config"]);
    }

    #[test]
    fn test_resolve_config_with_root() {
        let cli = Cli::try_parse_from(["pkgsetup", "--root", "/srv/project"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/project"));
        assert_eq!(config.project_name, "microbepy");
    }

    #[test]
    fn test_resolve_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "environment_manager": "micromamba" }"#).unwrap();

        let cli = Cli::try_parse_from([
            "pkgsetup",
            "--config",
            path.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.environment_manager, "micromamba");
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn test_resolve_config_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "project_name": "" }"#).unwrap();

        let cli = Cli::try_parse_from(["pkgsetup", "--config", path.to_str().unwrap()]).unwrap();
        assert!(cli.resolve_config().is_err());
    }
}

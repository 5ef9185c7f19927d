//! Data artifact staging
//!
//! Copies `<root>/<artifact_dir>/<project>.db` into
//! `<root>/<project>/<data_dir>/`, so the packager ships it as package
//! data. The source is checked before anything is created, so a missing
//! artifact leaves the destination untouched.

use crate::config::InstallerConfig;
use crate::error::{Result, SetupError};
use crate::filesystem::FileSystem;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the artifact ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Bytes written (0 in dry-run mode)
    pub bytes: u64,
}

/// Copy the bundled data artifact into the package data directory.
///
/// Creates the destination directory if needed (one level only; its
/// parent must exist) and overwrites any existing destination file.
/// With `dry_run` the source is still verified but nothing is written.
pub fn stage_data_file<F: FileSystem>(
    fs: &F,
    config: &InstallerConfig,
    dry_run: bool,
) -> Result<StagedArtifact> {
    let source = config.source_artifact();
    let dest_dir = config.destination_dir();
    let destination = config.destination_artifact();

    if !fs.is_file(&source) {
        return Err(SetupError::MissingArtifact { path: source });
    }

    if dry_run {
        info!(
            source = %source.display(),
            destination = %destination.display(),
            "[dry-run] would stage data artifact"
        );
        return Ok(StagedArtifact {
            source,
            destination,
            bytes: 0,
        });
    }

    if !fs.is_dir(&dest_dir) {
        debug!(path = %dest_dir.display(), "creating data directory");
        fs.create_dir(&dest_dir)
            .map_err(|source| SetupError::DirectoryCreation {
                path: dest_dir.clone(),
                source,
            })?;
    }

    let bytes = fs
        .copy(&source, &destination)
        .map_err(|e| SetupError::Copy {
            from: source.clone(),
            to: destination.clone(),
            source: e,
        })?;

    info!(
        destination = %destination.display(),
        bytes,
        "staged data artifact"
    );

    Ok(StagedArtifact {
        source,
        destination,
        bytes,
    })
}

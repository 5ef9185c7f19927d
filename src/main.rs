//! pkgsetup - main entry point
//!
//! Probe for the environment manager, stage the bundled database, install
//! requirements and run the packager. Exit status is 0 when the
//! environment manager is missing, 1 on a fatal installer error, and the
//! packager's own status otherwise.

use anyhow::Result;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pkgsetup::cli::Cli;
use pkgsetup::filesystem::OsFileSystem;
use pkgsetup::installer::{InstallOutcome, Installer};
use pkgsetup::process_guard::{self, ProcessGuard};
use pkgsetup::runner::SystemRunner;

/// Initialize logging. `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

fn main() {
    init_tracing();

    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            1
        }
    };

    std::process::exit(code);
}

fn run() -> Result<i32> {
    if let Err(e) = process_guard::init_signal_handlers() {
        // Drop of the guard below still cleans up on normal exit
        warn!("Failed to initialize signal handlers: {}", e);
    }

    let cli = Cli::parse_args();
    debug!(?cli, "CLI arguments parsed");

    let config = cli.resolve_config()?;

    if cli.show_config {
        println!("{}", config.to_json()?);
        return Ok(0);
    }

    info!(
        project = %config.project_name,
        root = %config.root.display(),
        dry_run = cli.dry_run,
        "pkgsetup starting"
    );

    let _guard = ProcessGuard::new();

    let installer = Installer::new(config, OsFileSystem, SystemRunner::dry_run(cli.dry_run))
        .with_passthrough(cli.packager_args)
        .with_dry_run(cli.dry_run);

    let outcome = installer.run()?;

    match &outcome {
        InstallOutcome::EnvironmentMissing { .. } => {
            info!("environment manager not found, nothing installed");
        }
        InstallOutcome::Completed {
            staged,
            dependencies,
            packaging,
        } => {
            info!(
                artifact = %staged.destination.display(),
                dependencies = dependencies.attempted,
                failed = dependencies.failed.len(),
                exit_code = ?packaging.exit_code,
                "setup finished"
            );
        }
    }

    Ok(outcome.exit_status())
}

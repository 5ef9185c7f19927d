//! Child process lifecycle management
//!
//! Every subprocess the installer launches (probe, dependency installs,
//! packaging) is recorded in a global registry while it runs. Children
//! that lead their own process group are signalled as a group; children
//! that share the installer's group (interactive tools) are signalled
//! directly. If the installer is interrupted, or the `ProcessGuard` held
//! by `main` is dropped, the registry sends SIGTERM first and SIGKILL to
//! anything still alive after the grace period.

#[cfg(target_os = "linux")]
use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// PIDs of subprocesses that are currently running
#[derive(Debug, Default)]
pub struct ChildRegistry {
    /// PID -> whether the child leads its own process group
    pids: HashMap<u32, bool>,
    cleanup_initiated: bool,
}

impl ChildRegistry {
    /// Get or create the global child registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    /// Track a running child. `own_group` is true when it was spawned with
    /// `in_new_process_group`.
    pub fn register(&mut self, pid: u32, own_group: bool) {
        self.pids.insert(pid, own_group);
        debug!(pid, own_group, "tracking child process");
    }

    /// Stop tracking a child that has been waited for
    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        debug!(pid, "child process finished");
    }

    /// Number of tracked children
    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// Signal every tracked child. Runs at most once per registry.
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if self.cleanup_initiated {
            return;
        }
        self.cleanup_initiated = true;

        if self.pids.is_empty() {
            return;
        }

        info!(count = self.pids.len(), "terminating child processes");

        let children: Vec<(u32, bool)> = self.pids.iter().map(|(&p, &g)| (p, g)).collect();
        let pids: Vec<u32> = children.iter().map(|&(pid, _)| pid).collect();
        for &(pid, own_group) in &children {
            terminate(pid, own_group, Signal::SIGTERM);
        }

        let start = Instant::now();
        while start.elapsed() < grace_period {
            if pids.iter().all(|&pid| !is_process_alive(pid)) {
                self.pids.clear();
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &(pid, own_group) in &children {
            if is_process_alive(pid) {
                warn!(pid, "child ignored SIGTERM, sending SIGKILL");
                terminate(pid, own_group, Signal::SIGKILL);
            }
        }

        self.pids.clear();
    }
}

fn terminate(pid: u32, own_group: bool, signal: Signal) {
    if own_group {
        match send_signal_to_group(pid, signal) {
            Ok(()) => return,
            Err(e) => warn!(pid, error = %e, "group signal failed, signalling process directly"),
        }
    }
    if let Err(e) = send_signal(pid, signal) {
        debug!(pid, error = %e, "signal not delivered");
    }
}

fn send_signal(pid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(pid as i32), signal)
}

/// Negative PID addresses the whole group, so grandchildren spawned by
/// pip or the packager are reached too.
fn send_signal_to_group(pgid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(-(pgid as i32)), signal)
}

/// Alive means it exists and is not a zombie
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }

    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // The state field follows the parenthesised command name
        if let Some(state) = stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
        {
            return !matches!(state, "Z" | "X");
        }
    }

    true
}

/// Terminates all tracked children when dropped
pub struct ProcessGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl ProcessGuard {
    /// Guard over the global registry
    pub fn new() -> Self {
        Self {
            registry: ChildRegistry::global(),
        }
    }

    /// Number of children still running
    pub fn child_count(&self) -> usize {
        self.registry.lock().map(|r| r.count()).unwrap_or(0)
    }
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.terminate_all(Duration::from_secs(5));
        }
    }
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP.
///
/// On delivery the tracked children are terminated and the installer exits
/// with `128 + signal`. Call once at startup.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!(signal = sig, "interrupted, cleaning up child processes");

            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(Duration::from_secs(3));
            }

            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for `std::process::Command`
pub trait CommandProcessGroup {
    /// Run the command as leader of a new process group. On Linux the child
    /// also receives SIGTERM if the installer dies.
    fn in_new_process_group(&mut self) -> &mut Self;

    /// Keep the installer's process group, but on Linux still receive
    /// SIGTERM if the installer dies.
    fn with_parent_death_signal(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;

        // SAFETY: the closure only makes async-signal-safe syscalls
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;
                set_parent_death_signal()
            });
        }
        self
    }

    fn with_parent_death_signal(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;

        // SAFETY: prctl is async-signal-safe
        unsafe {
            self.pre_exec(set_parent_death_signal);
        }
        self
    }
}

#[cfg(target_os = "linux")]
fn set_parent_death_signal() -> std::io::Result<()> {
    // SAFETY: prctl with PR_SET_PDEATHSIG only touches the calling process
    if unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) } == -1 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_parent_death_signal() -> std::io::Result<()> {
    Ok(())
}

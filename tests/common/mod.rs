#![allow(dead_code)]

use pkgsetup::{CommandOutcome, CommandRunner, Invocation, MemoryFileSystem, Result, SetupError};
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

pub const ROOT: &str = "/work";
pub const SOURCE: &str = "/work/Data/data_model/microbepy.db";
pub const DESTINATION: &str = "/work/microbepy/data_base/microbepy.db";
pub const REQUIREMENTS: &str = "/work/requirements.txt";

/// How the fake runner answers for a given program or requirement
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Exit(i32),
    NotFound,
}

/// Records every invocation and answers from a table.
///
/// Lookups try the last argument first (the requirement for installs),
/// then the program name. Anything unlisted exits 0.
#[derive(Default)]
pub struct RecordingRunner {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, key: &str, reply: Reply) -> Self {
        self.replies.insert(key.to_string(), reply);
        self
    }

    /// Runner whose environment manager probe fails to launch
    pub fn without_conda() -> Self {
        Self::new().reply("conda", Reply::NotFound)
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        self.calls.lock().unwrap().push(invocation.clone());

        let reply = invocation
            .args
            .last()
            .and_then(|a| self.replies.get(a))
            .or_else(|| self.replies.get(&invocation.program))
            .copied()
            .unwrap_or(Reply::Exit(0));

        match reply {
            Reply::Exit(code) => Ok(CommandOutcome::exited(code)),
            Reply::NotFound => Err(SetupError::spawn(
                invocation.program.clone(),
                io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            )),
        }
    }
}

/// Project tree with the package directory, the artifact and a requirements file
pub fn project_fs(artifact: &[u8], requirements: &str) -> MemoryFileSystem {
    MemoryFileSystem::new()
        .with_dir("/work/microbepy")
        .with_file(SOURCE, artifact.to_vec())
        .with_file(REQUIREMENTS, requirements)
}

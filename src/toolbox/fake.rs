//! In-memory toolbox for tests
//!
//! Fetches write registered payloads, extraction materializes the files
//! registered for that payload, and commands pop scripted outputs.

use crate::catalog::ArchiveKind;
use crate::error::{PrebuildError, PrebuildResult};
use crate::toolbox::{CommandOutput, CommandSpec, Toolbox};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// One recorded side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Extract(PathBuf),
    Run(CommandSpec),
}

#[derive(Default)]
pub struct FakeToolbox {
    payloads: RefCell<HashMap<String, Vec<u8>>>,
    archives: RefCell<HashMap<Vec<u8>, Vec<(String, Vec<u8>)>>>,
    outputs: RefCell<VecDeque<CommandOutput>>,
    calls: RefCell<Vec<Call>>,
    /// Files written before the next extraction fails
    interrupt_extract: RefCell<Option<usize>>,
}

impl FakeToolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `payload` for `url`; extracting it yields `files`
    pub fn serve_archive(&self, url: &str, payload: &[u8], files: &[(&str, &[u8])]) {
        self.payloads
            .borrow_mut()
            .insert(url.to_string(), payload.to_vec());
        self.archives.borrow_mut().insert(
            payload.to_vec(),
            files
                .iter()
                .map(|(name, bytes)| (name.to_string(), bytes.to_vec()))
                .collect(),
        );
    }

    /// Queue the output of the next command
    pub fn push_output(&self, output: CommandOutput) {
        self.outputs.borrow_mut().push_back(output);
    }

    /// Make the next extraction fail after writing `files` entries
    pub fn interrupt_next_extract(&self, files: usize) {
        *self.interrupt_extract.borrow_mut() = Some(files);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Fetch(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Run(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Toolbox for FakeToolbox {
    fn fetch(&self, url: &str, dest: &Path) -> PrebuildResult<()> {
        self.calls.borrow_mut().push(Call::Fetch(url.to_string()));
        let payload = self
            .payloads
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| PrebuildError::network(url, "404 Not Found"))?;
        fs::write(dest, payload).map_err(|e| PrebuildError::io("fake fetch", e))
    }

    fn extract(&self, archive: &Path, _kind: ArchiveKind, dest: &Path) -> PrebuildResult<()> {
        self.calls
            .borrow_mut()
            .push(Call::Extract(dest.to_path_buf()));
        let payload = fs::read(archive).map_err(|e| PrebuildError::io("fake extract", e))?;
        let files = self
            .archives
            .borrow()
            .get(&payload)
            .cloned()
            .unwrap_or_default();

        let interrupt = self.interrupt_extract.borrow_mut().take();
        fs::create_dir_all(dest).map_err(|e| PrebuildError::io("fake extract", e))?;
        for (written, (name, bytes)) in files.into_iter().enumerate() {
            if interrupt == Some(written) {
                return Err(PrebuildError::io(
                    "fake extract",
                    std::io::Error::other("no space left on device"),
                ));
            }
            let path = dest.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| PrebuildError::io("fake extract", e))?;
            }
            fs::write(&path, bytes).map_err(|e| PrebuildError::io("fake extract", e))?;
        }
        Ok(())
    }

    fn run(&self, command: &CommandSpec) -> PrebuildResult<CommandOutput> {
        self.calls.borrow_mut().push(Call::Run(command.clone()));
        Ok(self.outputs.borrow_mut().pop_front().unwrap_or(CommandOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

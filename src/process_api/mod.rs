//! Contains logic for looking up running processes.
//! [SysinfoSource] is the main artifact of this module. The rest of the application only cares
//! whether the editor is running, which [is_target_running] answers.

use sysinfo::{ProcessesToUpdate, System};
use tracing::trace;

/// Intended to serve as a contract for process enumeration. Every entry is looked up on its own,
/// so a process whose name can't be read shows up as [None] instead of failing the whole scan.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSource {
    fn process_names(&mut self) -> Vec<Option<String>>;
}

/// Cross-platform [ProcessSource] backed by sysinfo. The [System] is kept between scans so that
/// refreshes stay cheap.
pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoSource {
    fn process_names(&mut self) -> Vec<Option<String>> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.system
            .processes()
            .values()
            .map(|process| process.name().to_str().map(str::to_owned))
            .collect()
    }
}

/// Case-insensitive substring match on process names. `code` catches `code`, `Code.exe` and
/// `code-insiders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMatcher {
    needle: String,
}

impl ProcessMatcher {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }

    pub fn matches(&self, process_name: &str) -> bool {
        process_name.to_lowercase().contains(&self.needle)
    }
}

impl Default for ProcessMatcher {
    fn default() -> Self {
        Self::new("code")
    }
}

pub fn is_target_running(source: &mut dyn ProcessSource, matcher: &ProcessMatcher) -> bool {
    let mut skipped = 0usize;
    let found = source.process_names().into_iter().any(|name| match name {
        Some(name) => matcher.matches(&name),
        None => {
            skipped += 1;
            false
        }
    });
    if skipped > 0 {
        trace!("Skipped {skipped} processes with unreadable names");
    }
    found
}

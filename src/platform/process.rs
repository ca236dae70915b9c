use super::ProcessProbe;
use crate::error::ProbeError;
use crate::trigger::ProcessNames;
use log::error;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Process table lookups backed by `sysinfo`.
pub struct SysinfoProcessProbe {
    system: System,
}

impl Default for SysinfoProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProcessProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl ProcessProbe for SysinfoProcessProbe {
    fn is_running(&mut self, names: &ProcessNames) -> Result<bool, ProbeError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let processes = self.system.processes();
        if processes.is_empty() {
            error!("Error checking target process: process table is empty");
            return Ok(false);
        }

        Ok(any_named(
            processes.values().map(|p| p.name().to_str()),
            names,
        ))
    }
}

/// Whether any process name belongs to `names`. Names the OS could not
/// report as UTF-8 are skipped.
fn any_named<'a, I>(process_names: I, names: &ProcessNames) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    process_names
        .into_iter()
        .flatten()
        .any(|name| names.contains(name))
}

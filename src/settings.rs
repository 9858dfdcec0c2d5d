//! The settings file handed back to the loop runner on exit.
//!
//! Plain `key=value` lines so the surrounding shell script can source it
//! without a parser: the next iteration number, the (possibly edited)
//! queue sequences, and an abort marker when the operator killed the run.

use std::path::Path;

use crate::queue::IterationSlot;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings line: {0:?}")]
    Malformed(String),
}

/// What the next run should do, as decided by this one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub next_iteration: u32,
    pub aborted: bool,
    pub modes: Vec<String>,
    pub models: Vec<String>,
    pub wait_cmds: Vec<String>,
    pub delays: Vec<u64>,
    pub tui_flags: Vec<bool>,
}

impl Settings {
    /// Capture the edited queue for the next run.
    pub fn from_queue(next_iteration: u32, aborted: bool, slots: &[IterationSlot]) -> Self {
        Self {
            next_iteration,
            aborted,
            modes: slots.iter().map(|s| s.mode.clone()).collect(),
            models: slots.iter().map(|s| s.model.clone()).collect(),
            wait_cmds: slots
                .iter()
                .map(|s| s.wait_cmd.clone().unwrap_or_default())
                .collect(),
            delays: slots.iter().map(|s| s.delay_secs).collect(),
            tui_flags: slots.iter().map(|s| s.tui).collect(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.serialize())?;
        Ok(())
    }

    fn serialize(&self) -> String {
        let flags: Vec<&str> = self
            .tui_flags
            .iter()
            .map(|f| if *f { "1" } else { "0" })
            .collect();
        let delays: Vec<String> = self.delays.iter().map(u64::to_string).collect();
        format!(
            "iteration={}\naborted={}\nmodes={}\nmodels={}\nwait_cmds={}\ndelays={}\ntui_flags={}\n",
            self.next_iteration,
            self.aborted,
            self.modes.join(","),
            self.models.join(","),
            self.wait_cmds.join(","),
            delays.join(","),
            flags.join(","),
        )
    }

    pub fn read_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(SettingsError::Malformed(line.to_string()));
            };
            match key {
                "iteration" => {
                    settings.next_iteration = value
                        .parse()
                        .map_err(|_| SettingsError::Malformed(line.to_string()))?;
                }
                "aborted" => settings.aborted = value == "true" || value == "1",
                "modes" => settings.modes = split(value),
                "models" => settings.models = split(value),
                "wait_cmds" => settings.wait_cmds = split(value),
                "delays" => {
                    settings.delays = split(value)
                        .iter()
                        .map(|v| {
                            v.parse()
                                .map_err(|_| SettingsError::Malformed(line.to_string()))
                        })
                        .collect::<Result<_, _>>()?;
                }
                "tui_flags" => {
                    settings.tui_flags = split(value).iter().map(|v| v == "1" || v == "true").collect();
                }
                // Unknown keys from newer runners are ignored
                _ => {}
            }
        }
        Ok(settings)
    }
}

fn split(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::to_string).collect()
}

//! Per-application mute through PulseAudio / PipeWire sink inputs.
//!
//! Drives the `pactl` command line client. Output is parsed with `LC_ALL=C`
//! so field names stay stable across locales.

use super::{AppliedChange, AudioSessions};
use crate::constants::AUDIO_COMMAND_TIMEOUT;
use crate::error::SessionError;
use crate::trigger::ProcessNames;
use log::debug;
use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const PACTL: &str = "pactl";

/// Sink input index of the controlled application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkInputHandle(pub u32);

#[derive(Debug, Clone, Default, PartialEq)]
struct SinkInput {
    index: u32,
    muted: bool,
    /// Loudest channel, 1.0 == 100%.
    volume: f32,
    binary: Option<String>,
    application: Option<String>,
}

impl SinkInput {
    fn belongs_to(&self, names: &ProcessNames) -> bool {
        [self.binary.as_deref(), self.application.as_deref()]
            .into_iter()
            .flatten()
            .any(|name| names.contains(name))
    }
}

pub struct PulseSessions {
    timeout: Duration,
}

impl Default for PulseSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseSessions {
    pub fn new() -> Self {
        Self {
            timeout: AUDIO_COMMAND_TIMEOUT,
        }
    }

    fn sink_inputs(&self) -> Result<Vec<SinkInput>, SessionError> {
        let stdout = run_pactl(&["list", "sink-inputs"], self.timeout)?;
        Ok(parse_sink_inputs(&stdout))
    }

    fn sink_input(&self, handle: SinkInputHandle) -> Result<SinkInput, SessionError> {
        self.sink_inputs()?
            .into_iter()
            .find(|input| input.index == handle.0)
            .ok_or_else(|| SessionError::Stale(format!("sink input #{} is gone", handle.0)))
    }
}

impl AudioSessions for PulseSessions {
    type Handle = SinkInputHandle;

    fn check_available(&self) -> Result<(), SessionError> {
        run_pactl(&["info"], self.timeout).map(|_| ())
    }

    fn resolve(&self, names: &ProcessNames) -> Result<Option<SinkInputHandle>, SessionError> {
        Ok(self
            .sink_inputs()?
            .into_iter()
            .find(|input| input.belongs_to(names))
            .map(|input| SinkInputHandle(input.index)))
    }

    fn set_mute(&self, handle: &SinkInputHandle, mute: bool) -> Result<AppliedChange, SessionError> {
        if self.sink_input(*handle)?.muted == mute {
            return Ok(AppliedChange::Unchanged);
        }

        let index = handle.0.to_string();
        let flag = if mute { "1" } else { "0" };
        run_pactl(&["set-sink-input-mute", &index, flag], self.timeout)?;
        Ok(AppliedChange::Changed)
    }

    fn is_muted(&self, handle: &SinkInputHandle) -> Result<bool, SessionError> {
        Ok(self.sink_input(*handle)?.muted)
    }

    fn volume(&self, handle: &SinkInputHandle) -> Result<f32, SessionError> {
        Ok(self.sink_input(*handle)?.volume)
    }
}

/// Run `pactl` and return its stdout, killing it once `timeout` passes.
fn run_pactl(args: &[&str], timeout: Duration) -> Result<String, SessionError> {
    let mut child = Command::new(PACTL)
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => SessionError::Backend(format!("{PACTL} not found in PATH")),
            _ => SessionError::Backend(format!("failed to start {PACTL}: {e}")),
        })?;

    // Drain pipes on helper threads so a large listing cannot block the child
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SessionError::Timeout);
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(e) => return Err(SessionError::Backend(format!("waiting for {PACTL}: {e}"))),
        }
    };

    let stdout = stdout.map(collect).unwrap_or_default();
    let stderr = stderr.map(collect).unwrap_or_default();
    debug!("{PACTL} {} exited with {status}", args.join(" "));

    if status.success() {
        Ok(stdout)
    } else {
        Err(classify_failure(&stderr))
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            debug!("{PACTL} output truncated after {} bytes: {e}", buf.len());
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn classify_failure(stderr: &str) -> SessionError {
    let message = stderr.trim().to_string();
    if message.contains("No such entity") {
        SessionError::Stale(message)
    } else {
        SessionError::Backend(message)
    }
}

fn parse_sink_inputs(output: &str) -> Vec<SinkInput> {
    let mut inputs = Vec::new();
    let mut current: Option<SinkInput> = None;

    for line in output.lines() {
        let trimmed = line.trim();

        if let Some(index) = trimmed.strip_prefix("Sink Input #") {
            inputs.extend(current.take());
            current = index.trim().parse().ok().map(|index| SinkInput {
                index,
                ..SinkInput::default()
            });
            continue;
        }

        let Some(input) = current.as_mut() else {
            continue;
        };

        if let Some(value) = trimmed.strip_prefix("Mute:") {
            input.muted = value.trim() == "yes";
        } else if let Some(value) = trimmed.strip_prefix("Volume:") {
            input.volume = parse_volume(value);
        } else if let Some(value) = property(trimmed, "application.process.binary") {
            input.binary = Some(value);
        } else if let Some(value) = property(trimmed, "application.name") {
            input.application = Some(value);
        }
    }

    inputs.extend(current);
    inputs
}

/// `front-left: 65536 / 100% / 0.00 dB,   front-right: 32768 /  50% / ...`
fn parse_volume(value: &str) -> f32 {
    value
        .split_whitespace()
        .filter_map(|token| token.strip_suffix('%'))
        .filter_map(|percent| percent.parse::<f32>().ok())
        .fold(0.0, f32::max)
        / 100.0
}

/// `application.name = "Spotify"`
fn property(line: &str, key: &str) -> Option<String> {
    let value = line.strip_prefix(key)?.trim_start().strip_prefix('=')?;
    Some(value.trim().trim_matches('"').to_string())
}

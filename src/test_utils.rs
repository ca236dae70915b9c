//! Shared test utilities for tubemute.
//!
//! Scripted stand-ins for the desktop probes, the audio backend and the
//! notifier. Each fake keeps its observable state behind `Arc<Mutex<..>>` so
//! a test can hand a clone to the controller and inspect the original.

#![cfg(test)]

use crate::controller::{ControllerConfig, MuteController};
use crate::error::{NotifyError, ProbeError, SessionError};
use crate::platform::{AppliedChange, AudioSessions, FocusProbe, Notifier, ProcessProbe};
use crate::trigger::{ProcessNames, TriggerPatternSet};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Default config with a near-zero poll interval.
pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        poll_interval: Duration::from_millis(1),
        ..ControllerConfig::default()
    }
}

pub type TestController =
    MuteController<ScriptedFocus, ScriptedProcesses, FakeAudio, RecordingNotifier>;

pub fn controller_with(
    focus: ScriptedFocus,
    processes: ScriptedProcesses,
    audio: FakeAudio,
    notifier: RecordingNotifier,
) -> TestController {
    MuteController::new(
        test_config(),
        TriggerPatternSet::default(),
        focus,
        processes,
        audio,
        notifier,
    )
}

/// Focus probe that replays a script, then repeats a fallback title.
pub struct ScriptedFocus {
    script: RefCell<VecDeque<Result<String, ProbeError>>>,
    fallback: String,
    available: bool,
    /// Cleared once the script runs out, ending `MuteController::run`.
    stop_when_done: Option<Arc<AtomicBool>>,
}

impl ScriptedFocus {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProbeError>>,
    {
        Self {
            script: RefCell::new(script.into_iter().collect()),
            fallback: String::new(),
            available: true,
            stop_when_done: None,
        }
    }

    pub fn repeating(title: &str) -> Self {
        Self {
            fallback: title.to_string(),
            ..Self::new(Vec::<Result<String, ProbeError>>::new())
        }
    }

    pub fn stopping(mut self, running: Arc<AtomicBool>) -> Self {
        self.stop_when_done = Some(running);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl FocusProbe for ScriptedFocus {
    fn focused_title(&self) -> Result<String, ProbeError> {
        if let Some(next) = self.script.borrow_mut().pop_front() {
            return next;
        }
        if let Some(running) = &self.stop_when_done {
            running.store(false, Ordering::SeqCst);
        }
        Ok(self.fallback.clone())
    }

    fn check_available(&self) -> Result<(), ProbeError> {
        if self.available {
            Ok(())
        } else {
            Err(ProbeError::Unavailable {
                probe: "Window focus",
                reason: "scripted".into(),
            })
        }
    }
}

/// Process probe that replays a script, then repeats a fallback answer.
pub struct ScriptedProcesses {
    script: VecDeque<Result<bool, ProbeError>>,
    fallback: bool,
}

impl ScriptedProcesses {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<bool, ProbeError>>,
    {
        Self {
            script: script.into_iter().collect(),
            fallback: false,
        }
    }

    pub fn repeating(running: bool) -> Self {
        Self {
            fallback: running,
            ..Self::new(Vec::<Result<bool, ProbeError>>::new())
        }
    }
}

impl ProcessProbe for ScriptedProcesses {
    fn is_running(&mut self, _names: &ProcessNames) -> Result<bool, ProbeError> {
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }
}

#[derive(Debug)]
pub struct AudioState {
    pub muted: bool,
    pub volume: f32,
    pub session_missing: bool,
    pub stale: bool,
    pub unavailable: bool,
    /// Number of upcoming `set_mute` calls that fail.
    pub failing_sets: u32,
    /// Delay applied to every `set_mute` call.
    pub set_delay: Duration,
    pub set_calls: Vec<bool>,
    pub resolve_calls: usize,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            muted: false,
            volume: 1.0,
            session_missing: false,
            stale: false,
            unavailable: false,
            failing_sets: 0,
            set_delay: Duration::ZERO,
            set_calls: Vec::new(),
            resolve_calls: 0,
        }
    }
}

/// In-memory audio session that records every mute command.
#[derive(Clone, Default)]
pub struct FakeAudio {
    state: Arc<Mutex<AudioState>>,
}

impl FakeAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut AudioState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_calls(&self) -> Vec<bool> {
        self.with(|s| s.set_calls.clone())
    }

    pub fn resolve_calls(&self) -> usize {
        self.with(|s| s.resolve_calls)
    }

    fn check_stale(state: &AudioState) -> Result<(), SessionError> {
        if state.stale {
            Err(SessionError::Stale("scripted".into()))
        } else {
            Ok(())
        }
    }
}

impl AudioSessions for FakeAudio {
    type Handle = u32;

    fn check_available(&self) -> Result<(), SessionError> {
        if self.with(|s| s.unavailable) {
            Err(SessionError::Backend("scripted".into()))
        } else {
            Ok(())
        }
    }

    fn resolve(&self, _names: &ProcessNames) -> Result<Option<u32>, SessionError> {
        self.with(|s| {
            s.resolve_calls += 1;
            Ok((!s.session_missing).then_some(1))
        })
    }

    fn set_mute(&self, _handle: &u32, mute: bool) -> Result<AppliedChange, SessionError> {
        let delay = self.with(|s| s.set_delay);
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.with(|s| {
            s.set_calls.push(mute);
            Self::check_stale(s)?;
            if s.failing_sets > 0 {
                s.failing_sets -= 1;
                return Err(SessionError::Backend("scripted".into()));
            }
            if s.muted == mute {
                return Ok(AppliedChange::Unchanged);
            }
            s.muted = mute;
            Ok(AppliedChange::Changed)
        })
    }

    fn is_muted(&self, _handle: &u32) -> Result<bool, SessionError> {
        self.with(|s| {
            Self::check_stale(s)?;
            Ok(s.muted)
        })
    }

    fn volume(&self, _handle: &u32) -> Result<f32, SessionError> {
        self.with(|s| {
            Self::check_stale(s)?;
            Ok(s.volume)
        })
    }
}

/// Notifier that records delivered notifications, or fails every attempt.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<(String, String)>>>,
    attempts: Arc<Mutex<usize>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail {
            return Err(NotifyError("scripted".into()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(())
    }
}

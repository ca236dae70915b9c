//! Foreground window title and WASAPI per-session mute on Windows.

#![allow(unsafe_code, reason = "Win32 and WASAPI are only reachable through FFI")]

use super::{AppliedChange, AudioSessions, FocusProbe};
use crate::error::{ProbeError, SessionError};
use crate::trigger::ProcessNames;
use log::debug;
use std::cell::RefCell;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use windows::core::Interface;
use windows::Win32::Media::Audio::{
    eConsole, eRender, IAudioSessionControl2, IAudioSessionManager2, IMMDeviceEnumerator,
    ISimpleAudioVolume, MMDeviceEnumerator,
};
use windows::Win32::System::Com::{CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_MULTITHREADED};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
};

pub struct Win32FocusProbe;

impl Default for Win32FocusProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Win32FocusProbe {
    pub fn new() -> Self {
        Self
    }
}

impl FocusProbe for Win32FocusProbe {
    fn focused_title(&self) -> Result<String, ProbeError> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_invalid() {
            return Ok(String::new());
        }

        let len = unsafe { GetWindowTextLengthW(hwnd) };
        let Ok(len) = usize::try_from(len) else {
            return Ok(String::new());
        };
        if len == 0 {
            return Ok(String::new());
        }

        let mut buf = vec![0u16; len + 1];
        let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
        let copied = usize::try_from(copied).unwrap_or(0);
        let title = String::from_utf16_lossy(buf.get(..copied).unwrap_or_default());
        Ok(title.trim().to_string())
    }

    fn check_available(&self) -> Result<(), ProbeError> {
        // Any answer, including "no foreground window", proves the API works
        let _ = unsafe { GetForegroundWindow() };
        Ok(())
    }
}

/// Per-process audio sessions on the default render endpoint.
///
/// COM is initialized on the constructing thread; build and use this on the
/// same thread.
pub struct WasapiSessions {
    system: RefCell<System>,
}

impl Default for WasapiSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl WasapiSessions {
    pub fn new() -> Self {
        // S_FALSE when COM is already initialized on this thread is fine
        let _ = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        Self {
            system: RefCell::new(System::new()),
        }
    }

    fn session_manager(&self) -> Result<IAudioSessionManager2, SessionError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(backend)?;
            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(backend)?;
            device
                .Activate::<IAudioSessionManager2>(CLSCTX_ALL, None)
                .map_err(backend)
        }
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        let mut system = self.system.borrow_mut();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing(),
        );
        system
            .process(pid)
            .and_then(|p| p.name().to_str())
            .map(str::to_owned)
    }
}

impl AudioSessions for WasapiSessions {
    type Handle = ISimpleAudioVolume;

    fn check_available(&self) -> Result<(), SessionError> {
        let manager = self.session_manager()?;
        unsafe { manager.GetSessionEnumerator() }
            .map(|_| ())
            .map_err(backend)
    }

    fn resolve(&self, names: &ProcessNames) -> Result<Option<ISimpleAudioVolume>, SessionError> {
        let manager = self.session_manager()?;
        let sessions = unsafe { manager.GetSessionEnumerator() }.map_err(backend)?;
        let count = unsafe { sessions.GetCount() }.map_err(backend)?;

        for i in 0..count {
            // Sessions can vanish while we enumerate; skip those
            let Ok(control) = (unsafe { sessions.GetSession(i) }) else {
                continue;
            };
            let Ok(control2) = control.cast::<IAudioSessionControl2>() else {
                continue;
            };
            let Ok(pid) = (unsafe { control2.GetProcessId() }) else {
                continue;
            };
            if pid == 0 {
                continue;
            }
            let Some(name) = self.process_name(pid) else {
                continue;
            };

            if names.contains(&name) {
                debug!("Found audio session for {name} (pid {pid})");
                return control.cast::<ISimpleAudioVolume>().map(Some).map_err(backend);
            }
        }

        Ok(None)
    }

    fn set_mute(&self, handle: &ISimpleAudioVolume, mute: bool) -> Result<AppliedChange, SessionError> {
        if self.is_muted(handle)? == mute {
            return Ok(AppliedChange::Unchanged);
        }
        unsafe { handle.SetMute(mute, std::ptr::null()) }.map_err(stale)?;
        Ok(AppliedChange::Changed)
    }

    fn is_muted(&self, handle: &ISimpleAudioVolume) -> Result<bool, SessionError> {
        unsafe { handle.GetMute() }
            .map(|m| m.as_bool())
            .map_err(stale)
    }

    fn volume(&self, handle: &ISimpleAudioVolume) -> Result<f32, SessionError> {
        unsafe { handle.GetMasterVolume() }.map_err(stale)
    }
}

fn backend(e: windows::core::Error) -> SessionError {
    SessionError::Backend(e.to_string())
}

fn stale(e: windows::core::Error) -> SessionError {
    SessionError::Stale(e.to_string())
}

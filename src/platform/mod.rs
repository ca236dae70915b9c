pub mod types;

mod notify;
mod process;

pub use notify::DesktopNotifier;
pub use process::SysinfoProcessProbe;
pub use types::{AppliedChange, AudioSessions, FocusProbe, Notifier, ProcessProbe};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub mod pulse;

#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(target_os = "linux")]
pub use linux::X11FocusProbe as NativeFocusProbe;

#[cfg(target_os = "linux")]
pub use pulse::PulseSessions as NativeAudioSessions;

#[cfg(target_os = "windows")]
pub use win32::Win32FocusProbe as NativeFocusProbe;

#[cfg(target_os = "windows")]
pub use win32::WasapiSessions as NativeAudioSessions;

// Stubs for platforms without a native backend; the startup check rejects them
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod unsupported {
    use super::{AppliedChange, AudioSessions, FocusProbe};
    use crate::error::{ProbeError, SessionError};
    use crate::trigger::ProcessNames;

    pub struct UnsupportedFocusProbe;

    impl UnsupportedFocusProbe {
        pub fn new() -> Self {
            Self
        }
    }

    impl FocusProbe for UnsupportedFocusProbe {
        fn focused_title(&self) -> Result<String, ProbeError> {
            Ok(String::new())
        }

        fn check_available(&self) -> Result<(), ProbeError> {
            Err(ProbeError::Unavailable {
                probe: "Window focus",
                reason: "no backend for this platform".into(),
            })
        }
    }

    pub struct UnsupportedAudioSessions;

    impl UnsupportedAudioSessions {
        pub fn new() -> Self {
            Self
        }
    }

    impl AudioSessions for UnsupportedAudioSessions {
        type Handle = ();

        fn check_available(&self) -> Result<(), SessionError> {
            Err(SessionError::Backend("no backend for this platform".into()))
        }

        fn resolve(&self, _names: &ProcessNames) -> Result<Option<()>, SessionError> {
            Ok(None)
        }

        fn set_mute(&self, _handle: &(), _mute: bool) -> Result<AppliedChange, SessionError> {
            Err(SessionError::NotFound)
        }

        fn is_muted(&self, _handle: &()) -> Result<bool, SessionError> {
            Err(SessionError::NotFound)
        }

        fn volume(&self, _handle: &()) -> Result<f32, SessionError> {
            Err(SessionError::NotFound)
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub use unsupported::{
    UnsupportedAudioSessions as NativeAudioSessions, UnsupportedFocusProbe as NativeFocusProbe,
};

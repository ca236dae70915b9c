use crate::error::{NotifyError, ProbeError, SessionError};
use crate::trigger::ProcessNames;
use std::fmt::Debug;

/// Reports the title of the window that currently has focus.
pub trait FocusProbe {
    /// Title of the focused window, or an empty string when nothing has focus.
    fn focused_title(&self) -> Result<String, ProbeError>;

    fn check_available(&self) -> Result<(), ProbeError>;
}

/// Reports whether any process from a name set is running.
pub trait ProcessProbe {
    fn is_running(&mut self, names: &ProcessNames) -> Result<bool, ProbeError>;
}

/// Whether a mute command actually flipped the mute bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedChange {
    Changed,
    Unchanged,
}

/// Per-application audio session control.
///
/// Handles go stale once the owning process exits; every operation on a
/// stale handle fails with [`SessionError::Stale`].
pub trait AudioSessions {
    type Handle: Clone + Debug;

    fn check_available(&self) -> Result<(), SessionError>;

    fn resolve(&self, names: &ProcessNames) -> Result<Option<Self::Handle>, SessionError>;

    /// Idempotent: muting an already muted session reports `Unchanged`.
    fn set_mute(&self, handle: &Self::Handle, mute: bool) -> Result<AppliedChange, SessionError>;

    fn is_muted(&self, handle: &Self::Handle) -> Result<bool, SessionError>;

    fn volume(&self, handle: &Self::Handle) -> Result<f32, SessionError>;
}

/// Transient user notification, best-effort.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

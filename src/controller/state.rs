use std::time::{Duration, Instant};

/// Mute state of the controlled application as last commanded by us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MuteState {
    #[default]
    Unmuted,
    Muted,
}

/// Everything the poll loop remembers between ticks.
///
/// `mute == Muted` means the last successful command was "mute" and no
/// successful "unmute" has happened since.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub mute: MuteState,
    pub last_notification: Option<Instant>,
    pub consecutive_errors: u32,
}

impl ControllerState {
    pub fn is_muted(&self) -> bool {
        self.mute == MuteState::Muted
    }

    /// Whether a notification may be shown at `now`.
    pub fn notification_allowed(&self, now: Instant, cooldown: Duration) -> bool {
        self.last_notification
            .is_none_or(|last| now.saturating_duration_since(last) >= cooldown)
    }
}

/// Observations of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTick {
    pub trigger_active: bool,
    pub target_running: bool,
}

impl PollTick {
    pub fn new(trigger_active: bool, target_running: bool) -> Self {
        Self {
            trigger_active,
            target_running,
        }
    }
}

/// What the controller does in response to a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Issue a mute command; commit to `Muted` on success.
    Mute,
    /// Issue an unmute command; commit to `Unmuted` on success.
    Unmute,
    /// Target is gone: drop back to `Unmuted` without touching the audio session.
    Forget,
    Hold,
}

/// Transition table of the mute state machine.
pub fn decide(current: MuteState, tick: PollTick) -> Action {
    match (current, tick.trigger_active, tick.target_running) {
        (MuteState::Unmuted, true, true) => Action::Mute,
        (MuteState::Muted, false, true) => Action::Unmute,
        (MuteState::Muted, _, false) => Action::Forget,
        (MuteState::Unmuted, _, _) | (MuteState::Muted, true, true) => Action::Hold,
    }
}

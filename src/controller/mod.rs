mod session;
mod state;

pub use session::SessionCache;
pub use state::{decide, Action, ControllerState, MuteState, PollTick};

use crate::constants::{
    CLEANUP_TIMEOUT, CONTROLLED_APP_NAME, MAX_CONSECUTIVE_ERRORS, NOTIFICATION_COOLDOWN,
    POLL_INTERVAL, SESSION_CACHE_TTL, TRIGGER_NAME,
};
use crate::error::{ProbeError, StartupError};
use crate::platform::{AppliedChange, AudioSessions, FocusProbe, Notifier, ProcessProbe};
use crate::trigger::TriggerPatternSet;
use log::{debug, error, info, log_enabled, warn, Level};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep between checks of the running flag.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub session_cache_ttl: Duration,
    pub notification_cooldown: Duration,
    pub max_consecutive_errors: u32,
    pub cleanup_timeout: Duration,
    pub controlled_app: String,
    pub trigger_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            session_cache_ttl: SESSION_CACHE_TTL,
            notification_cooldown: NOTIFICATION_COOLDOWN,
            max_consecutive_errors: MAX_CONSECUTIVE_ERRORS,
            cleanup_timeout: CLEANUP_TIMEOUT,
            controlled_app: CONTROLLED_APP_NAME.to_string(),
            trigger_name: TRIGGER_NAME.to_string(),
        }
    }
}

/// Why the poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The running flag was cleared (user interrupt or service stop).
    Interrupted,
    TooManyErrors { count: u32 },
}

/// Owns the mute state machine and everything it needs between ticks.
///
/// All mutation goes through `&mut self`, so one transition-and-command step
/// is in flight at a time.
pub struct MuteController<F, P, A, N>
where
    A: AudioSessions,
{
    config: ControllerConfig,
    patterns: TriggerPatternSet,
    focus: F,
    processes: P,
    audio: A,
    notifier: N,
    state: ControllerState,
    cache: SessionCache<A::Handle>,
}

impl<F, P, A, N> MuteController<F, P, A, N>
where
    F: FocusProbe,
    P: ProcessProbe,
    A: AudioSessions,
    N: Notifier,
{
    pub fn new(
        config: ControllerConfig,
        patterns: TriggerPatternSet,
        focus: F,
        processes: P,
        audio: A,
        notifier: N,
    ) -> Self {
        let cache = SessionCache::new(config.session_cache_ttl);
        Self {
            config,
            patterns,
            focus,
            processes,
            audio,
            notifier,
            state: ControllerState::default(),
            cache,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Verify the audio and window backends answer before entering the loop.
    pub fn check_dependencies(&self) -> Result<(), StartupError> {
        self.audio.check_available()?;
        info!("Audio utilities available");

        self.focus.check_available()?;
        info!("Window utilities available");

        Ok(())
    }

    /// Poll until `running` is cleared or too many ticks fail in a row.
    pub fn run(&mut self, running: &AtomicBool) -> RunOutcome {
        while running.load(Ordering::SeqCst) {
            if let Some(outcome) = self.step() {
                return outcome;
            }
            sleep_while_running(running, self.config.poll_interval);
        }
        RunOutcome::Interrupted
    }

    /// One tick plus error accounting. Returns an outcome when the loop must stop.
    pub fn step(&mut self) -> Option<RunOutcome> {
        match self.tick() {
            Ok(_) => {
                self.state.consecutive_errors = 0;
                None
            }
            Err(e) => {
                self.state.consecutive_errors += 1;
                let count = self.state.consecutive_errors;
                error!("Exception in poll loop (#{count}): {e}");
                self.cache.clear();

                if count >= self.config.max_consecutive_errors {
                    error!("Critical: Too many consecutive errors ({count}). Stopping.");
                    return Some(RunOutcome::TooManyErrors { count });
                }
                None
            }
        }
    }

    /// Observe the desktop once and act on the transition table.
    pub fn tick(&mut self) -> Result<Action, ProbeError> {
        let tick = self.observe()?;
        let action = decide(self.state.mute, tick);
        let app = self.config.controlled_app.clone();
        let trigger = self.config.trigger_name.clone();

        match action {
            Action::Mute => {
                info!("{trigger} active and {app} running. Muting {app}...");
                if self.apply_mute(true) {
                    self.state.mute = MuteState::Muted;
                }
            }
            Action::Unmute => {
                info!("{trigger} not active and {app} muted. Unmuting {app}...");
                if self.apply_mute(false) {
                    self.state.mute = MuteState::Unmuted;
                }
            }
            Action::Forget => {
                info!("{app} not running. Resetting mute state.");
                self.state.mute = MuteState::Unmuted;
                self.cache.clear();
            }
            Action::Hold => {
                if log_enabled!(Level::Debug) {
                    let audible = tick.target_running && self.is_target_audible();
                    debug!(
                        "Status - {trigger}: {}, {app}: {}, muted: {}, audible: {audible}",
                        tick.trigger_active,
                        tick.target_running,
                        self.state.is_muted()
                    );
                }
            }
        }

        Ok(action)
    }

    fn observe(&mut self) -> Result<PollTick, ProbeError> {
        let title = self.focus.focused_title()?;
        let trigger_active = self.patterns.matches(&title);
        let target_running = self.processes.is_running(self.patterns.process_names())?;
        Ok(PollTick::new(trigger_active, target_running))
    }

    /// Whether the target is currently producing sound (unmuted, volume > 0).
    ///
    /// Read-only, so a cached session handle is acceptable here.
    pub fn is_target_audible(&mut self) -> bool {
        let Some(handle) = self.resolve_handle(false) else {
            return false;
        };

        let result = self.audio.volume(&handle).and_then(|volume| {
            let muted = self.audio.is_muted(&handle)?;
            Ok(volume > 0.0 && !muted)
        });

        result.unwrap_or_else(|e| {
            debug!("Error checking {} audio state: {e}", self.config.controlled_app);
            self.cache.clear();
            false
        })
    }

    /// Issue a mute or unmute command. Returns true when the transition may
    /// be committed, including when the session already had the wanted state.
    fn apply_mute(&mut self, mute: bool) -> bool {
        let app = self.config.controlled_app.clone();

        // Never trust a cached handle for the authoritative command
        let Some(handle) = self.resolve_handle(true) else {
            warn!("{app} session not found. Is {app} running and playing audio?");
            return false;
        };

        match self.audio.set_mute(&handle, mute) {
            Ok(AppliedChange::Changed) => {
                let state = if mute { "Muted" } else { "Unmuted" };
                let cause = if mute { "focus" } else { "unfocus" };
                info!("{app} {state} successfully.");
                self.maybe_notify(
                    &format!("{app} {state}"),
                    &format!(
                        "{app} has been {state} due to {} {cause}.",
                        self.config.trigger_name
                    ),
                );
                true
            }
            Ok(AppliedChange::Unchanged) => {
                let state = if mute { "muted" } else { "unmuted" };
                debug!("{app} already {state}. No action taken.");
                true
            }
            Err(e) => {
                let verb = if mute { "mute" } else { "unmute" };
                error!("Failed to {verb} {app}: {e}");
                self.cache.clear();
                false
            }
        }
    }

    fn resolve_handle(&mut self, force_refresh: bool) -> Option<A::Handle> {
        let now = Instant::now();
        if !force_refresh {
            if let Some(handle) = self.cache.get(now) {
                return Some(handle.clone());
            }
        }

        match self.audio.resolve(self.patterns.process_names()) {
            Ok(Some(handle)) => {
                self.cache.store(handle.clone(), now);
                Some(handle)
            }
            Ok(None) => {
                self.cache.clear();
                None
            }
            Err(e) => {
                error!("Error getting {} session: {e}", self.config.controlled_app);
                self.cache.clear();
                None
            }
        }
    }

    /// Show a notification unless one went out within the cooldown.
    ///
    /// The cooldown restarts even when delivery fails, so a broken notifier
    /// is not retried on every tick.
    pub fn maybe_notify(&mut self, title: &str, message: &str) {
        let now = Instant::now();
        if !self
            .state
            .notification_allowed(now, self.config.notification_cooldown)
        {
            debug!("Notification suppressed by cooldown: {title}");
            return;
        }

        self.state.last_notification = Some(now);
        if let Err(e) = self.notifier.notify(title, message) {
            error!("Failed to send notification: {e}");
        }
    }

    /// Best-effort cleanup: unmute once if we left the target muted.
    pub fn shutdown(&mut self) {
        if !self.state.is_muted() {
            return;
        }

        info!("Cleaning up: Unmuting {}...", self.config.controlled_app);
        if self.apply_mute(false) {
            self.state.mute = MuteState::Unmuted;
        }
    }
}

fn sleep_while_running(running: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline || !running.load(Ordering::SeqCst) {
            return;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

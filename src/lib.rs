pub mod constants;
pub mod controller;
pub mod error;
pub mod logging;
pub mod platform;
pub mod service;
#[cfg(test)]
mod test_utils;
pub mod trigger;

use crate::constants::{CONTROLLED_APP_NAME, TRIGGER_NAME};
use crate::controller::{ControllerConfig, MuteController};
use crate::platform::{DesktopNotifier, NativeAudioSessions, NativeFocusProbe, SysinfoProcessProbe};
use crate::service::{spawn_signal_listener, MuteService};
use crate::trigger::TriggerPatternSet;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::mpsc;

pub type NativeController =
    MuteController<NativeFocusProbe, SysinfoProcessProbe, NativeAudioSessions, DesktopNotifier>;

fn build_native_controller(config: ControllerConfig) -> NativeController {
    MuteController::new(
        config,
        TriggerPatternSet::default(),
        NativeFocusProbe::new(),
        SysinfoProcessProbe::new(),
        NativeAudioSessions::new(),
        DesktopNotifier::default(),
    )
}

pub fn run() -> ExitCode {
    logging::init();
    info!("Starting {CONTROLLED_APP_NAME}-{TRIGGER_NAME} auto-mute...");
    info!("Press Ctrl+C to stop");

    let config = ControllerConfig::default();
    let service = MuteService::new(config.poll_interval + config.cleanup_timeout);
    let (tx, rx) = mpsc::channel();

    if let Err(e) = spawn_signal_listener(tx.clone()) {
        warn!("Could not listen for shutdown signals: {e}");
    }

    let worker = match service.start(move || build_native_controller(config), tx) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Critical: failed to start controller thread: {e}");
            return ExitCode::FAILURE;
        }
    };

    service.supervise(&rx, &worker).into()
}

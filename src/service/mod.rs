use crate::controller::{MuteController, RunOutcome};
use crate::error::StartupError;
use crate::platform::{AudioSessions, FocusProbe, Notifier, ProcessProbe};
use log::{debug, error, info, warn};
use std::io;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often the supervisor checks that the worker thread is still alive.
const LIVENESS_CHECK: Duration = Duration::from_millis(500);

/// Messages from the worker and signal threads to the supervisor.
#[derive(Debug)]
pub enum ServiceEvent {
    /// Ctrl+C or SIGTERM.
    Interrupted,
    StartupFailed(StartupError),
    Stopped(RunOutcome),
    CleanedUp,
}

/// Process exit status chosen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    Failed,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Clean => ExitCode::SUCCESS,
            ExitStatus::Failed => ExitCode::FAILURE,
        }
    }
}

/// Runs the mute controller on a worker thread and owns its shutdown.
pub struct MuteService {
    running: Arc<AtomicBool>,
    cleanup_deadline: Duration,
}

impl MuteService {
    /// `cleanup_deadline` bounds how long shutdown waits for the final unmute.
    pub fn new(cleanup_deadline: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            cleanup_deadline,
        }
    }

    /// Spawn the worker. The controller is built on the worker thread, so
    /// backends tied to their creating thread stay there.
    pub fn start<B, F, P, A, N>(
        &self,
        build: B,
        events: Sender<ServiceEvent>,
    ) -> io::Result<JoinHandle<()>>
    where
        B: FnOnce() -> MuteController<F, P, A, N> + Send + 'static,
        F: FocusProbe + 'static,
        P: ProcessProbe + 'static,
        A: AudioSessions + 'static,
        N: Notifier + 'static,
    {
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("mute-controller".into())
            .spawn(move || {
                let mut controller = build();

                if let Err(e) = controller.check_dependencies() {
                    running.store(false, Ordering::SeqCst);
                    let _ = events.send(ServiceEvent::StartupFailed(e));
                    return;
                }

                let outcome = controller.run(&running);
                running.store(false, Ordering::SeqCst);
                let _ = events.send(ServiceEvent::Stopped(outcome));

                controller.shutdown();
                let _ = events.send(ServiceEvent::CleanedUp);
            })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait for the worker to finish and pick the exit status.
    pub fn supervise(
        &self,
        events: &Receiver<ServiceEvent>,
        worker: &JoinHandle<()>,
    ) -> ExitStatus {
        loop {
            match events.recv_timeout(LIVENESS_CHECK) {
                Ok(ServiceEvent::Interrupted) => {
                    info!("Stopped by user");
                    self.stop();
                    return self.await_cleanup(events, ExitStatus::Clean);
                }
                Ok(ServiceEvent::StartupFailed(e)) => {
                    error!("Dependency check failed: {e}");
                    error!("Make sure the audio and window services are reachable");
                    return ExitStatus::Failed;
                }
                Ok(ServiceEvent::Stopped(RunOutcome::Interrupted)) => {
                    return self.await_cleanup(events, ExitStatus::Clean);
                }
                Ok(ServiceEvent::Stopped(RunOutcome::TooManyErrors { count })) => {
                    debug!("Worker stopped after {count} consecutive errors");
                    return self.await_cleanup(events, ExitStatus::Failed);
                }
                Ok(ServiceEvent::CleanedUp) => return ExitStatus::Clean,
                Err(RecvTimeoutError::Timeout) if worker.is_finished() => {
                    error!("Critical: worker thread exited unexpectedly");
                    return ExitStatus::Failed;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    error!("Critical: worker thread exited unexpectedly");
                    return ExitStatus::Failed;
                }
            }
        }
    }

    fn await_cleanup(&self, events: &Receiver<ServiceEvent>, status: ExitStatus) -> ExitStatus {
        let deadline = Instant::now() + self.cleanup_deadline;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match events.recv_timeout(remaining) {
                Ok(ServiceEvent::CleanedUp) => return status,
                Ok(ServiceEvent::StartupFailed(_)) => return ExitStatus::Failed,
                Ok(ServiceEvent::Interrupted | ServiceEvent::Stopped(_)) => {}
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Cleanup did not finish within {:?}, exiting anyway",
                        self.cleanup_deadline
                    );
                    return status;
                }
                Err(RecvTimeoutError::Disconnected) => return status,
            }
        }
    }
}

/// Forward Ctrl+C (and SIGTERM on Unix) to the supervisor.
pub fn spawn_signal_listener(events: Sender<ServiceEvent>) -> io::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || match runtime.block_on(shutdown_signal()) {
            Ok(()) => {
                let _ = events.send(ServiceEvent::Interrupted);
            }
            Err(e) => warn!("Shutdown signal handler unavailable: {e}"),
        })
}

#[cfg(unix)]
async fn shutdown_signal() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => {
            debug!("Received SIGTERM");
            Ok(())
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}

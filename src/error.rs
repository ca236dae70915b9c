use thiserror::Error;

/// Failure of a desktop probe (focused window, process table)
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{probe} unavailable: {reason}")]
    Unavailable { probe: &'static str, reason: String },

    #[error("Display connection lost: {0}")]
    Disconnected(String),
}

/// Failure of an audio session operation
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Audio session not found")]
    NotFound,

    /// The handle points at a session that no longer exists (target exited).
    #[error("Audio session is stale: {0}")]
    Stale(String),

    #[error("Audio backend error: {0}")]
    Backend(String),

    #[error("Audio operation timed out")]
    Timeout,
}

/// Failure to display a notification
#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Conditions that stop the process before the poll loop starts
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Window utilities unavailable: {0}")]
    Probe(#[from] ProbeError),

    #[error("Audio utilities unavailable: {0}")]
    Audio(#[from] SessionError),

    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Could not open log file: {0}")]
    LogFile(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_cause() {
        let err = ProbeError::Unavailable {
            probe: "Window focus",
            reason: "no display".into(),
        };
        assert_eq!(err.to_string(), "Window focus unavailable: no display");

        let err = StartupError::from(SessionError::Backend("pactl missing".into()));
        assert_eq!(
            err.to_string(),
            "Audio utilities unavailable: Audio backend error: pactl missing"
        );
    }
}

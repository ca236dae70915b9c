//! Desktop notification delivery through `notify_rust`.

use super::Notifier;
use crate::constants::{APP_NAME, NOTIFICATION_TIMEOUT};
use crate::error::NotifyError;
use notify_rust::{Notification, Timeout};
use std::time::Duration;

pub struct DesktopNotifier {
    app_name: String,
    timeout: Duration,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new(APP_NAME, NOTIFICATION_TIMEOUT)
    }
}

impl DesktopNotifier {
    pub fn new(app_name: &str, timeout: Duration) -> Self {
        Self {
            app_name: app_name.to_string(),
            timeout,
        }
    }

    fn timeout_ms(&self) -> u32 {
        u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX)
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .timeout(Timeout::Milliseconds(self.timeout_ms()))
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_clamped_to_u32() {
        let notifier = DesktopNotifier::new(APP_NAME, Duration::from_secs(3));
        assert_eq!(notifier.timeout_ms(), 3000);

        let notifier = DesktopNotifier::new(APP_NAME, Duration::MAX);
        assert_eq!(notifier.timeout_ms(), u32::MAX);
    }

    #[test]
    #[ignore] // Requires a notification daemon
    fn test_show_notification() {
        let notifier = DesktopNotifier::default();
        assert!(notifier.notify("Spotify Muted", "Test notification").is_ok());
    }
}

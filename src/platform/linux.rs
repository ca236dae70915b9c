use super::FocusProbe;
use crate::error::ProbeError;
use log::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

/// Focused window title via EWMH properties on X11.
pub struct X11FocusProbe {
    conn: Option<RustConnection>,
    root: Window,
}

impl Default for X11FocusProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl X11FocusProbe {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let Some(root) = conn.setup().roots.get(screen_num).map(|s| s.root) else {
                    warn!(
                        "Invalid screen number {screen_num} ({} screens available). Window focus detection disabled.",
                        conn.setup().roots.len()
                    );
                    return Self { conn: None, root: 0 };
                };
                Self {
                    conn: Some(conn),
                    root,
                }
            }
            Err(e) => {
                // Keep running without a display; the startup check reports it
                warn!("Failed to connect to X server: {e}. Window focus detection disabled.");
                Self { conn: None, root: 0 }
            }
        }
    }

    fn conn(&self) -> Result<&RustConnection, ProbeError> {
        self.conn.as_ref().ok_or_else(|| ProbeError::Unavailable {
            probe: "Window focus",
            reason: "no X11 connection".into(),
        })
    }

    fn atom(&self, name: &str) -> Result<Option<Atom>, ProbeError> {
        let cookie = self
            .conn()?
            .intern_atom(false, name.as_bytes())
            .map_err(disconnected)?;
        Ok(reply(cookie.reply())?.map(|r| r.atom))
    }

    fn window_property(&self, window: Window, atom: Atom) -> Result<Option<String>, ProbeError> {
        let cookie = self
            .conn()?
            .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
            .map_err(disconnected)?;

        Ok(reply(cookie.reply())?
            .filter(|r| !r.value.is_empty())
            .map(|r| String::from_utf8_lossy(&r.value).into_owned()))
    }

    fn active_window_id(&self) -> Result<Option<Window>, ProbeError> {
        let Some(atom) = self.atom("_NET_ACTIVE_WINDOW")? else {
            return Ok(None);
        };
        let cookie = self
            .conn()?
            .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, 1)
            .map_err(disconnected)?;

        Ok(reply(cookie.reply())?
            .and_then(|r| r.value32().and_then(|mut values| values.next()))
            .filter(|&id| id != x11rb::NONE))
    }
}

impl FocusProbe for X11FocusProbe {
    fn focused_title(&self) -> Result<String, ProbeError> {
        let Some(window) = self.active_window_id()? else {
            return Ok(String::new());
        };

        let mut title = match self.atom("_NET_WM_NAME")? {
            Some(atom) => self.window_property(window, atom)?,
            None => None,
        };
        if title.is_none() {
            title = self.window_property(window, AtomEnum::WM_NAME.into())?;
        }

        Ok(title.map(|t| t.trim().to_string()).unwrap_or_default())
    }

    fn check_available(&self) -> Result<(), ProbeError> {
        self.active_window_id().map(|_| ())
    }
}

fn disconnected(e: ConnectionError) -> ProbeError {
    ProbeError::Disconnected(e.to_string())
}

/// X11 protocol errors (window closed mid-query) read as "no value";
/// a broken connection is a probe failure.
fn reply<T>(result: Result<T, ReplyError>) -> Result<Option<T>, ProbeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::ConnectionError(e)) => Err(disconnected(e)),
        Err(ReplyError::X11Error(e)) => {
            debug!("X11 error while reading focused window: {e:?}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_read_as_missing_value() {
        let broken: Result<u32, ReplyError> =
            Err(ReplyError::ConnectionError(ConnectionError::UnknownError));
        assert!(matches!(reply(broken), Err(ProbeError::Disconnected(_))));

        assert_eq!(reply::<u32>(Ok(5)).unwrap(), Some(5));
    }

    #[test]
    #[ignore] // Requires X11 display
    fn test_get_focused_title() {
        let probe = X11FocusProbe::new();
        probe.check_available().unwrap();
        let title = probe.focused_title().unwrap();
        assert_eq!(title, title.trim());
    }
}

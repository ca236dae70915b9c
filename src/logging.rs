//! Log backend: `env_logger` writing timestamped lines to stdout and to an
//! append-only file in the platform data directory.

use crate::constants::LOG_FILE_NAME;
use crate::error::StartupError;
use directories::ProjectDirs;
use env_logger::{Builder, Env, Target, WriteStyle};
use log::{info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes every buffer to `primary`, and to `secondary` when present.
///
/// A failing secondary is dropped so the primary keeps receiving logs.
pub struct TeeWriter<A, B> {
    primary: A,
    secondary: Option<B>,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(primary: A, secondary: Option<B>) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(secondary) = self.secondary.as_mut() {
            if secondary.write_all(buf).is_err() {
                self.secondary = None;
            }
        }
        self.primary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(secondary) = self.secondary.as_mut() {
            if secondary.flush().is_err() {
                self.secondary = None;
            }
        }
        self.primary.flush()
    }
}

/// Default log file location, creating the data directory if needed.
pub fn log_file_path() -> Result<PathBuf, StartupError> {
    let proj_dirs =
        ProjectDirs::from("com", "tubemute", "TubeMute").ok_or(StartupError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    fs::create_dir_all(data_dir)?;
    Ok(data_dir.join(LOG_FILE_NAME))
}

pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global logger. Defaults to `info`, overridable via `RUST_LOG`.
///
/// Failing to open the log file is not fatal: logging continues on stdout.
pub fn init() {
    let file = log_file_path().and_then(|path| {
        open_log_file(&path)
            .map(|file| (file, path))
            .map_err(StartupError::from)
    });

    let (file, outcome) = match file {
        Ok((file, path)) => (Some(file), Ok(path)),
        Err(e) => (None, Err(e)),
    };

    let writer = TeeWriter::new(io::stdout(), file);
    let result = Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", buf.timestamp(), record.level(), record.args())
        })
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(writer)))
        .try_init();

    if let Err(e) = result {
        warn!("Logger already initialized: {e}");
        return;
    }

    match outcome {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => warn!("{e}; logging to stdout only"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tee_writes_to_both_sinks() {
        let mut tee = TeeWriter::new(Vec::<u8>::new(), Some(Vec::<u8>::new()));
        tee.write_all(b"[ts] INFO: hello\n").unwrap();

        assert_eq!(tee.primary, b"[ts] INFO: hello\n");
        assert_eq!(tee.secondary.as_deref(), Some(&b"[ts] INFO: hello\n"[..]));
    }

    #[test]
    fn test_tee_survives_broken_secondary() {
        let mut tee = TeeWriter::new(Vec::<u8>::new(), Some(BrokenWriter));
        tee.write_all(b"first\n").unwrap();
        tee.write_all(b"second\n").unwrap();

        assert_eq!(tee.primary, b"first\nsecond\n");
        assert!(tee.secondary.is_none());
    }

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);

        open_log_file(&path).unwrap().write_all(b"one\n").unwrap();
        open_log_file(&path).unwrap().write_all(b"two\n").unwrap();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }
}

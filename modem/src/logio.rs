use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use termcolor::{Color, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

use crate::time::wall_clock_hms;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Appends `[SENT]`/`[RECVD]` lines to a protocol log file and echoes
/// them, colorized, to stdout. One instance per file (`send.txt` or
/// `receive.txt`); both are cheap enough to open in append mode per
/// write rather than holding a handle across the process lifetime, which
/// sidesteps any ordering surprise if something else tails the file.
pub struct EventLog {
    path: PathBuf,
    color: Color,
    stdout: Mutex<StandardStream>,
}

impl EventLog {
    pub fn new(path: PathBuf, color: Color) -> Self {
        EventLog {
            path,
            color,
            stdout: Mutex::new(StandardStream::stdout(termcolor::ColorChoice::Auto)),
        }
    }

    /// Formats and records one event line: `TAG: <bits-as-list> <addr> HH:MM:SS`.
    pub fn record(&self, tag: &str, bits: &[u8], addr: u8) -> Result<(), LogError> {
        let line = format!("{tag}: {:?} {} {}", bits, addr, wall_clock_hms());
        self.append_file(&line)?;
        self.write_stdout(&line);
        Ok(())
    }

    fn append_file(&self, line: &str) -> Result<(), LogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Open {
                path: self.path.clone(),
                source,
            })?;
        writeln!(file, "{line}").map_err(|source| LogError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn write_stdout(&self, line: &str) {
        let mut stdout = self.stdout.lock().unwrap();
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(self.color)));
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.reset();
    }
}

pub fn sent_log(path: &Path) -> EventLog {
    EventLog::new(path.to_path_buf(), Color::Green)
}

pub fn received_log(path: &Path) -> EventLog {
    EventLog::new(path.to_path_buf(), Color::Cyan)
}

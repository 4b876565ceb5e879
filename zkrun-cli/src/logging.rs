use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Append-mode log file that can be reopened in place after rotation
#[derive(Clone)]
pub struct LogFile {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl LogFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(open_append(path)?)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Swap in a fresh handle to the configured path
    pub fn reopen(&self) -> io::Result<()> {
        let fresh = open_append(&self.path)?;
        *lock(&self.file) = fresh;
        Ok(())
    }

    pub fn writer(&self) -> LogWriter {
        LogWriter {
            file: self.file.clone(),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn lock(file: &Mutex<File>) -> MutexGuard<'_, File> {
    file.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer handed to the fmt layer for each event; flushes every write
pub struct LogWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = lock(&self.file);
        let written = file.write(buf)?;
        file.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.file).flush()
    }
}

/// Install the global subscriber writing into `path`
///
/// The filter comes from `RUST_LOG` and defaults to `info`; ZooKeeper client
/// chatter is held to warnings.
pub fn init(path: &Path) -> io::Result<LogFile> {
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log = LogFile::open(path)?;
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::new(format!("zookeeper_client=warn,{level}"));

    let writer = log.clone();
    registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(move || writer.writer())
                .with_ansi(false),
        )
        .try_init()
        .map_err(io::Error::other)?;
    Ok(log)
}

/// Reopen the log file whenever SIGHUP arrives
pub fn reopen_on_hangup(log: LogFile) -> io::Result<()> {
    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            match log.reopen() {
                Ok(()) => info!(path = %log.path().display(), "Log file reopened"),
                Err(e) => error!(path = %log.path().display(), "Failed to reopen log file: {}", e),
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_to_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("zkrun.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let log = LogFile::open(&path).unwrap();
        writeln!(log.writer(), "later").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_reopen_after_rotation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("zkrun.log");
        let rotated = temp.path().join("zkrun.log.1");

        let log = LogFile::open(&path).unwrap();
        let mut writer = log.writer();
        writeln!(writer, "before rotation").unwrap();

        std::fs::rename(&path, &rotated).unwrap();
        writeln!(writer, "still old file").unwrap();

        log.reopen().unwrap();
        writeln!(writer, "after reopen").unwrap();

        assert_eq!(
            std::fs::read_to_string(&rotated).unwrap(),
            "before rotation\nstill old file\n"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "after reopen\n");
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("zkrun.log");
        assert!(LogFile::open(&path).is_err());
    }
}

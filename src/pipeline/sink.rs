//! Append-only record of domains flagged as spoofable.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::SinkError;

/// Destination for flagged domains, callable from any thread.
pub trait VulnerabilitySink: Sync {
    fn record(&self, domain: &str);

    /// Flushes and releases the underlying resource. Called once, after the
    /// scan is done; later `record` calls are ignored.
    fn close(&self) -> Result<(), SinkError>;
}

/// Ledger file with one flagged domain per line.
///
/// Every line is written straight to the file under the lock so a killed
/// process keeps what was recorded so far.
pub struct LedgerSink {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
    write_failures: AtomicUsize,
}

impl LedgerSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| SinkError::create(path, err))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            file: Mutex::new(Some(file)),
            write_failures: AtomicUsize::new(0),
        })
    }

    /// Sink that drops every record, used when the ledger could not be opened.
    pub fn disabled() -> Self {
        Self {
            path: None,
            file: Mutex::new(None),
            write_failures: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn write_failures(&self) -> usize {
        self.write_failures.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VulnerabilitySink for LedgerSink {
    fn record(&self, domain: &str) {
        let line = format!("{domain}\n");
        let outcome = match self.lock().as_mut() {
            Some(file) => file.write_all(line.as_bytes()),
            None => return,
        };

        if let Err(err) = outcome {
            let previous = self.write_failures.fetch_add(1, Ordering::Relaxed);
            if previous == 0 {
                warn!(domain, error = %err, "failed to record vulnerable domain in ledger");
            } else {
                debug!(domain, error = %err, failures = previous + 1, "ledger write failed");
            }
        }
    }

    fn close(&self) -> Result<(), SinkError> {
        let Some(mut file) = self.lock().take() else {
            return Ok(());
        };
        let path = self.path.clone().unwrap_or_default();
        file.flush().map_err(|err| SinkError::flush(&path, err))?;
        file.sync_all().map_err(|err| SinkError::flush(&path, err))
    }
}

/// In-memory ledger, handy for embedding the scanner or for tests.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl VulnerabilitySink for MemorySink {
    fn record(&self, domain: &str) {
        if self.is_closed() {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(domain.to_string());
    }

    fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

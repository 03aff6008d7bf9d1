//! Printing and previewing generated invoices.
//!
//! The document only touches disk as a temporary file that is removed once
//! the external program is done with it. Files left behind by an interrupted
//! run are swept on the next print.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use tokio::process::Command;

use super::InvoiceError;

/// File name prefix of transient invoice files.
pub const TRANSIENT_PREFIX: &str = "schoolsoft-invoice-";

/// How long a viewer has to open the file after its launcher returns.
pub const VIEWER_LINGER: Duration = Duration::from_secs(5);

/// Transient files older than this belong to a run that never cleaned up.
const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Destination for a finished invoice.
pub trait PrintSink: Send + Sync {
    /// Print or display `pdf`.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError` if the document could not be handed over.
    fn print(&self, pdf: &[u8]) -> impl Future<Output = Result<(), InvoiceError>> + Send;
}

/// Write `pdf` to a uniquely named file in `dir`.
///
/// The file is deleted when the returned handle is dropped.
///
/// # Errors
///
/// Returns `InvoiceError::Io` if the file cannot be written.
pub fn write_transient(dir: &Path, pdf: &[u8]) -> Result<NamedTempFile, InvoiceError> {
    let mut file = tempfile::Builder::new()
        .prefix(TRANSIENT_PREFIX)
        .suffix(".pdf")
        .tempfile_in(dir)?;
    file.write_all(pdf)?;
    file.flush()?;
    Ok(file)
}

/// Remove transient invoice files in `dir` older than `max_age`.
///
/// Returns how many were removed. Unreadable entries are skipped.
pub fn sweep_stale(dir: &Path, max_age: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let now = SystemTime::now();

    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(TRANSIENT_PREFIX)
        })
        .filter(|entry| {
            entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age >= max_age)
        })
        .filter(|entry| std::fs::remove_file(entry.path()).is_ok())
        .count()
}

/// Runs an external program with the invoice file as its last argument.
///
/// `lp` prints; `xdg-open` previews. Viewers are launched detached, so
/// [`CommandPrinter::viewer`] keeps the file for [`VIEWER_LINGER`] after the
/// launcher exits.
#[derive(Debug, Clone)]
pub struct CommandPrinter {
    command: String,
    dir: PathBuf,
    linger: Duration,
}

impl CommandPrinter {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            dir: std::env::temp_dir(),
            linger: Duration::ZERO,
        }
    }

    /// A printer for a viewer that opens the file after returning.
    #[must_use]
    pub fn viewer(command: impl Into<String>) -> Self {
        Self::new(command).with_linger(VIEWER_LINGER)
    }

    #[must_use]
    pub const fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Stage transient files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    fn failure(&self, reason: impl Into<String>) -> InvoiceError {
        InvoiceError::Print {
            command: self.command.clone(),
            reason: reason.into(),
        }
    }

    async fn stage(&self, pdf: &[u8]) -> Result<NamedTempFile, InvoiceError> {
        let dir = self.dir.clone();
        let pdf = pdf.to_vec();
        tokio::task::spawn_blocking(move || {
            let swept = sweep_stale(&dir, STALE_AFTER);
            if swept > 0 {
                tracing::debug!(swept, "Removed stale invoice files");
            }
            write_transient(&dir, &pdf)
        })
        .await
        .map_err(|e| self.failure(e.to_string()))?
    }
}

impl PrintSink for CommandPrinter {
    async fn print(&self, pdf: &[u8]) -> Result<(), InvoiceError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| self.failure("empty command"))?;

        let file = self.stage(pdf).await?;
        tracing::info!(command = %self.command, path = %file.path().display(), "Sending invoice");

        let status = Command::new(program)
            .args(parts)
            .arg(file.path())
            .status()
            .await
            .map_err(|e| self.failure(e.to_string()))?;

        if status.success() && !self.linger.is_zero() {
            tokio::time::sleep(self.linger).await;
        }
        if let Err(e) = file.close() {
            tracing::warn!(error = %e, "Failed to remove invoice file");
        }

        if status.success() {
            Ok(())
        } else {
            Err(self.failure(format!("exited with {status}")))
        }
    }
}

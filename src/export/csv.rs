//! Processed-message audit log in CSV.
//!
//! The file is opened, appended to and closed for every row, so a crash
//! between two messages never loses a row that was already reported.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SorterError};
use crate::model::record::ProcessedRecord;

/// Header row: Time, Sender, Subject, Category, Attachments.
pub const HEADER: &str = "Время,Отправитель,Тема,Категория,Вложения";

/// Row terminator (RFC 4180).
const LINE_END: &str = "\r\n";

/// Append-only CSV log with one row per processed message.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Open the log at `path`, creating it (and its parent directory) with
    /// the header row if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SorterError::io(parent, e))?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                write!(file, "{HEADER}{LINE_END}")
                    .and_then(|()| file.flush())
                    .map_err(|e| SorterError::io(&path, e))?;
                info!(path = %path.display(), "Created audit log");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(SorterError::io(&path, e)),
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for `record`.
    pub fn record(&self, record: &ProcessedRecord) -> Result<()> {
        let row = format_row(record);
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| SorterError::io(&self.path, e))?;
        write!(file, "{row}{LINE_END}")
            .and_then(|()| file.flush())
            .map_err(|e| SorterError::io(&self.path, e))
    }
}

/// Render a record as a CSV line (without the line terminator).
pub fn format_row(record: &ProcessedRecord) -> String {
    [
        record.timestamp_field(),
        record.sender.clone(),
        record.subject.clone(),
        record.category.clone(),
        record.attachments_field(),
    ]
    .iter()
    .map(|field| csv_escape(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

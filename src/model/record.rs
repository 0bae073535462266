//! One row of the processed-message audit log.

use std::path::PathBuf;

use chrono::{DateTime, Local};

/// `strftime` format of the time column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between saved attachment paths in a single cell.
pub const ATTACHMENT_SEPARATOR: &str = "; ";

/// Everything the audit log keeps about a processed message.
#[derive(Debug, Clone)]
pub struct ProcessedRecord {
    /// Local wall-clock time the message was processed.
    pub timestamp: DateTime<Local>,
    pub sender: String,
    pub subject: String,
    pub category: String,
    /// Saved attachment paths, in part order.
    pub attachments: Vec<PathBuf>,
}

impl ProcessedRecord {
    /// The time column, e.g. `2024-05-01 09:30:00`.
    pub fn timestamp_field(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The attachments column; empty when nothing was saved.
    pub fn attachments_field(&self) -> String {
        self.attachments
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(ATTACHMENT_SEPARATOR)
    }
}

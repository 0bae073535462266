//! `mailsort`: a background IMAP mail sorter.
//!
//! Every few minutes the daemon checks a mailbox for unread messages, puts
//! each one in a category by matching its subject against a keyword table,
//! saves its attachments under `attachments/<category>/`, and appends a row
//! describing it to `logs/email_log.csv`.

pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod poll;
pub mod scheduler;

pub use error::{Result, SorterError};

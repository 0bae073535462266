//! Persisting what a cycle produced: attachment files and the CSV audit log.

pub mod attachment;
pub mod csv;

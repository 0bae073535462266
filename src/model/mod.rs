//! Core data model types: category rules, inbound messages and audit records.

pub mod address;
pub mod category;
pub mod message;
pub mod record;

//! Turning raw fetched bytes into an [`InboundMessage`](crate::model::message::InboundMessage).

pub mod mime;

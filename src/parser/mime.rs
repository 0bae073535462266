//! MIME message parsing: header decoding and the part tree, via `mail-parser`.

use mail_parser::MessageParser;

use crate::error::{Result, SorterError};
use crate::model::address::EmailAddress;
use crate::model::message::{InboundMessage, MessageId};

/// Subject used when a message has no `Subject:` header or an empty one.
pub const NO_SUBJECT: &str = "Без темы";

/// Parse a complete raw message (headers + body) as fetched from the server.
///
/// RFC 2047 encoded-words in `Subject:` and `From:` are decoded; a subject
/// that is missing or blank is replaced with `no_subject`.
pub fn parse_inbound(id: MessageId, raw: &[u8], no_subject: &str) -> Result<InboundMessage> {
    let raw = strip_bom(raw);
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(SorterError::Parse {
            id: id.to_string(),
            reason: "empty message".into(),
        });
    }

    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| SorterError::Parse {
            id: id.to_string(),
            reason: "not a valid RFC 5322 message".into(),
        })?
        .into_owned();

    let subject = decode_subject(parsed.subject(), no_subject);
    let sender = EmailAddress::from_header(parsed.from()).display();

    Ok(InboundMessage::new(id, sender, subject, parsed))
}

/// Pick the subject to classify and log.
///
/// `mail-parser` has already resolved encoded-words; plain subjects pass
/// through unchanged.
pub fn decode_subject(subject: Option<&str>, no_subject: &str) -> String {
    match subject.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => no_subject.to_string(),
    }
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

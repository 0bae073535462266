//! A fetched message and a borrowed view over its MIME parts.

use std::borrow::Cow;

use mail_parser::decoders::base64::base64_decode;
use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use mail_parser::{Encoding, Message, MessagePart, MimeHeaders, PartType};

/// Mailbox identifier of a message (the IMAP UID).
///
/// Only meaningful inside the session that listed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fetched and parsed message.
///
/// Lives for a single iteration of the poll cycle.
pub struct InboundMessage {
    /// Identifier the message was fetched by.
    pub id: MessageId,
    /// Decoded sender, `Name <addr>` or bare address.
    pub sender: String,
    /// Decoded subject, never empty (a placeholder replaces a missing one).
    pub subject: String,
    parsed: Message<'static>,
}

impl InboundMessage {
    pub(crate) fn new(
        id: MessageId,
        sender: String,
        subject: String,
        parsed: Message<'static>,
    ) -> Self {
        Self {
            id,
            sender,
            subject,
            parsed,
        }
    }

    /// Iterate over every part of the MIME tree depth-first in document
    /// order, starting with the message itself.
    ///
    /// An attached `message/rfc822` part is yielded first (its payload is the
    /// raw nested message), followed by every part of the nested message.
    /// The iterator is lazy and can be restarted by calling `parts()` again.
    pub fn parts(&self) -> Parts<'_> {
        Parts {
            stack: vec![(&self.parsed, self.parsed.parts.iter())],
        }
    }
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("id", &self.id)
            .field("sender", &self.sender)
            .field("subject", &self.subject)
            .field("parts", &self.parsed.parts.len())
            .finish()
    }
}

/// Depth-first walk over a message and the messages attached to it.
pub struct Parts<'a> {
    /// One entry per message being walked; the last one is the innermost.
    stack: Vec<(&'a Message<'static>, std::slice::Iter<'a, MessagePart<'static>>)>,
}

impl<'a> Iterator for Parts<'a> {
    type Item = MimePart<'a>;

    fn next(&mut self) -> Option<MimePart<'a>> {
        loop {
            let (message, parts) = self.stack.last_mut()?;
            let message: &'a Message<'static> = *message;
            match parts.next() {
                Some(part) => {
                    if let PartType::Message(nested) = &part.body {
                        self.stack.push((nested, nested.parts.iter()));
                    }
                    return Some(MimePart::from_parsed(message, part));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// What the attachment extractor needs to know about a MIME part.
#[derive(Debug, Clone)]
pub struct MimePart<'a> {
    /// `multipart/*` container; carries no payload of its own.
    pub composite: bool,
    /// `Content-Disposition` type (`attachment`, `inline`, ...), if the header is present.
    pub disposition: Option<&'a str>,
    /// Filename from `Content-Disposition` or the `name` parameter of `Content-Type`.
    pub filename: Option<&'a str>,
    /// Payload with the transfer encoding removed, byte for byte.
    pub payload: Cow<'a, [u8]>,
}

impl<'a> MimePart<'a> {
    fn from_parsed(message: &'a Message<'static>, part: &'a MessagePart<'static>) -> Self {
        Self {
            composite: matches!(part.body, PartType::Multipart(_)),
            disposition: part.content_disposition().map(|d| d.ctype()),
            filename: part.attachment_name(),
            payload: transfer_decoded(message, part),
        }
    }
}

/// Body bytes of `part` with only the transfer encoding undone.
///
/// `mail-parser` converts `text/*` bodies to UTF-8 using their charset, so
/// those are decoded again from the raw message. Other parts are already
/// stored as decoded bytes.
fn transfer_decoded<'a>(
    message: &'a Message<'static>,
    part: &'a MessagePart<'static>,
) -> Cow<'a, [u8]> {
    if !matches!(part.body, PartType::Text(_) | PartType::Html(_)) {
        return Cow::Borrowed(part.contents());
    }

    let raw = message
        .raw_message
        .get(part.offset_body..part.offset_end)
        .unwrap_or_default();
    let decoded = match part.encoding {
        Encoding::Base64 => base64_decode(raw),
        Encoding::QuotedPrintable => quoted_printable_decode(raw),
        Encoding::None => None,
    };
    decoded.map_or(Cow::Borrowed(raw), Cow::Owned)
}

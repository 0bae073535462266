//! Mailbox transport: the seam between the poll cycle and the mail server.
//!
//! A [`MailTransport`] opens an authenticated [`MailSession`]; the session
//! lists, fetches and finally logs out. The production implementation speaks
//! IMAP ([`imap_session::ImapTransport`]); tests plug in an in-memory one.

pub mod imap_session;

use crate::config::MailboxConfig;
use crate::error::Result;
use crate::model::message::MessageId;

pub use imap_session::ImapTransport;

/// Something that can connect and log in to a mailbox.
pub trait MailTransport {
    type Session: MailSession;

    /// Connect to `config.host` and authenticate.
    ///
    /// Fails with [`SorterError::Connect`](crate::error::SorterError::Connect)
    /// when the server cannot be reached and
    /// [`SorterError::Auth`](crate::error::SorterError::Auth) when the
    /// credentials are rejected.
    fn open(&self, config: &MailboxConfig) -> Result<Self::Session>;
}

/// An authenticated session.
pub trait MailSession {
    /// Select the folder subsequent commands operate on.
    fn select(&mut self, folder: &str) -> Result<()>;

    /// Identifiers of the messages matching `criteria`, in ascending order.
    fn search(&mut self, criteria: &str) -> Result<Vec<MessageId>>;

    /// Full raw bytes of one message.
    fn fetch(&mut self, id: MessageId) -> Result<Vec<u8>>;

    /// End the session.
    fn logout(&mut self) -> Result<()>;
}

impl<S: MailSession + ?Sized> MailSession for Box<S> {
    fn select(&mut self, folder: &str) -> Result<()> {
        (**self).select(folder)
    }

    fn search(&mut self, criteria: &str) -> Result<Vec<MessageId>> {
        (**self).search(criteria)
    }

    fn fetch(&mut self, id: MessageId) -> Result<Vec<u8>> {
        (**self).fetch(id)
    }

    fn logout(&mut self) -> Result<()> {
        (**self).logout()
    }
}

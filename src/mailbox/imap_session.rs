//! IMAP implementation of the mailbox transport (`imap` + `native-tls`).
//!
//! Messages are addressed by UID. Fetching `RFC822` makes the server set
//! `\Seen`, which is what keeps a message from being listed by the next
//! `UNSEEN` search.

use std::io::{Read, Write};
use std::net::TcpStream;

use native_tls::TlsConnector;
use tracing::debug;

use crate::config::MailboxConfig;
use crate::error::{Result, SorterError};
use crate::model::message::MessageId;

use super::{MailSession, MailTransport};

/// Connects over implicit TLS, or plain TCP when `tls = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImapTransport;

impl MailTransport for ImapTransport {
    type Session = Box<dyn MailSession>;

    fn open(&self, config: &MailboxConfig) -> Result<Self::Session> {
        let host = config.host.as_str();
        let connect_err = |e: imap::Error| SorterError::Connect {
            host: format!("{host}:{}", config.port),
            reason: e.to_string(),
        };

        debug!(host, port = config.port, tls = config.tls, "Connecting");
        if config.tls {
            let tls = TlsConnector::builder().build()?;
            let client = imap::connect((host, config.port), host, &tls).map_err(connect_err)?;
            let session = client
                .login(&config.address, &config.password)
                .map_err(|(e, _)| SorterError::Auth(e.to_string()))?;
            Ok(Box::new(ImapSession { inner: session }))
        } else {
            let stream = TcpStream::connect((host, config.port)).map_err(|e| {
                SorterError::Connect {
                    host: format!("{host}:{}", config.port),
                    reason: e.to_string(),
                }
            })?;
            let mut client = imap::Client::new(stream);
            client.read_greeting().map_err(connect_err)?;
            let session = client
                .login(&config.address, &config.password)
                .map_err(|(e, _)| SorterError::Auth(e.to_string()))?;
            Ok(Box::new(ImapSession { inner: session }))
        }
    }
}

/// Authenticated IMAP session over any byte stream.
struct ImapSession<T: Read + Write> {
    inner: imap::Session<T>,
}

impl<T: Read + Write> MailSession for ImapSession<T> {
    fn select(&mut self, folder: &str) -> Result<()> {
        let mailbox = self.inner.select(folder).map_err(protocol)?;
        debug!(folder, exists = mailbox.exists, "Selected mailbox");
        Ok(())
    }

    fn search(&mut self, criteria: &str) -> Result<Vec<MessageId>> {
        let uids = self.inner.uid_search(criteria).map_err(protocol)?;
        let mut ids: Vec<MessageId> = uids.into_iter().map(MessageId).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn fetch(&mut self, id: MessageId) -> Result<Vec<u8>> {
        let fetches = self
            .inner
            .uid_fetch(id.to_string(), "RFC822")
            .map_err(protocol)?;
        fetches
            .iter()
            .find_map(|f| f.body())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| SorterError::Protocol(format!("no body returned for UID {id}")))
    }

    fn logout(&mut self) -> Result<()> {
        self.inner.logout().map_err(protocol)
    }
}

fn protocol(e: imap::Error) -> SorterError {
    SorterError::Protocol(e.to_string())
}

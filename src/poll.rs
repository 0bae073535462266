//! One mail check: connect, list unread, process each message, disconnect.

use chrono::Local;
use tracing::{debug, info, warn, Level};

use crate::classifier::Classifier;
use crate::config::MailboxConfig;
use crate::error::Result;
use crate::export::attachment::AttachmentExtractor;
use crate::export::csv::AuditLog;
use crate::logging;
use crate::mailbox::{MailSession, MailTransport};
use crate::model::message::MessageId;
use crate::model::record::ProcessedRecord;
use crate::parser::mime;

/// What a successful cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages fetched, classified and recorded.
    pub messages: usize,
    /// Attachments written to disk.
    pub attachments: usize,
}

/// Everything one cycle needs, built once at startup.
pub struct PollCycle<T: MailTransport> {
    transport: T,
    mailbox: MailboxConfig,
    no_subject: String,
    classifier: Classifier,
    extractor: AttachmentExtractor,
    audit: AuditLog,
}

impl<T: MailTransport> PollCycle<T> {
    pub fn new(
        transport: T,
        mailbox: MailboxConfig,
        no_subject: impl Into<String>,
        classifier: Classifier,
        extractor: AttachmentExtractor,
        audit: AuditLog,
    ) -> Self {
        Self {
            transport,
            mailbox,
            no_subject: no_subject.into(),
            classifier,
            extractor,
            audit,
        }
    }

    /// Run one check of the mailbox.
    ///
    /// The first failing step ends the cycle and its error is returned;
    /// messages already processed keep their saved files and CSV rows.
    /// The session is logged out whether or not processing succeeded.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        logging::note(Level::INFO, "Mail check started");

        let mut session = self.transport.open(&self.mailbox)?;
        let outcome = self.process_mailbox(&mut session);

        match (&outcome, session.logout()) {
            (Ok(_), Err(e)) => return Err(e),
            (Err(_), Err(e)) => debug!(error = %e, "Logout after failed cycle also failed"),
            _ => {}
        }

        let report = outcome?;
        info!(
            messages = report.messages,
            attachments = report.attachments,
            "Mail check finished"
        );
        Ok(report)
    }

    fn process_mailbox(&self, session: &mut T::Session) -> Result<CycleReport> {
        session.select(&self.mailbox.folder)?;
        let ids = session.search(&self.mailbox.search)?;
        debug!(count = ids.len(), criteria = %self.mailbox.search, "Listed messages");

        let mut report = CycleReport::default();
        for id in ids {
            report.attachments += self.process_message(session, id)?;
            report.messages += 1;
        }
        Ok(report)
    }

    /// Fetch, classify, extract and record one message; returns the number
    /// of attachments saved.
    fn process_message(&self, session: &mut T::Session, id: MessageId) -> Result<usize> {
        let raw = session.fetch(id)?;
        let message = mime::parse_inbound(id, &raw, &self.no_subject)?;
        let category = self.classifier.classify(&message.subject);

        info!(
            id = %id,
            category,
            sender = %message.sender,
            subject = %message.subject,
            "Processing message"
        );

        let attachments = self.extractor.extract(message.parts(), category)?;
        if attachments.is_empty() {
            debug!(id = %id, "No attachments");
        }

        let record = ProcessedRecord {
            timestamp: Local::now(),
            sender: message.sender.clone(),
            subject: message.subject.clone(),
            category: category.to_string(),
            attachments,
        };
        let saved = record.attachments.len();
        if let Err(e) = self.audit.record(&record) {
            warn!(id = %id, "Attachments saved but the audit row could not be written");
            return Err(e);
        }
        Ok(saved)
    }
}

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    application::services::mail::{MailSender, MailTransportProvider},
    domain::models::{OutgoingEmail, TransportConfig},
};

#[derive(Default)]
struct Outbox {
    built: usize,
    sent: Vec<OutgoingEmail>,
}

/// Keeps delivered emails in memory. Addresses passed to `failing_for` are
/// rejected on send.
#[derive(Clone, Default)]
pub struct RecordingTransportProvider {
    outbox: Arc<Mutex<Outbox>>,
    rejected: Arc<HashSet<String>>,
}

impl RecordingTransportProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outbox: Arc::default(),
            rejected: Arc::new(addresses.into_iter().map(Into::into).collect()),
        }
    }

    /// Number of senders built so far.
    pub fn built(&self) -> usize {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .built
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .clone()
    }
}

impl MailTransportProvider for RecordingTransportProvider {
    fn build(&self, _config: &TransportConfig) -> anyhow::Result<Arc<dyn MailSender>> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .built += 1;
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl MailSender for RecordingTransportProvider {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        if self.rejected.contains(&email.to) {
            anyhow::bail!("mailbox unavailable: {}", email.to);
        }
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .push(email.clone());
        Ok(())
    }
}

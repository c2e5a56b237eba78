use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    application::services::mail::{MailSender, MailTransportProvider},
    domain::models::{OutgoingEmail, TransportConfig},
};

/// Logs every email instead of sending it.
pub struct LogTransportProvider;

impl LogTransportProvider {
    pub fn new() -> Arc<dyn MailTransportProvider> {
        Arc::new(Self) as Arc<dyn MailTransportProvider>
    }
}

impl MailTransportProvider for LogTransportProvider {
    fn build(&self, config: &TransportConfig) -> anyhow::Result<Arc<dyn MailSender>> {
        Ok(Arc::new(LogMailSender {
            host: config.host.clone(),
        }))
    }
}

struct LogMailSender {
    host: String,
}

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(
            host = %self.host,
            from = %email.from_address,
            to = %email.to,
            subject = %email.subject,
            "log backend: email not sent"
        );
        Ok(())
    }
}

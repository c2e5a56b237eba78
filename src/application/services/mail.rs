use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::models::{OutgoingEmail, TransportConfig};

/// One connection-ready sender; `send` performs a single delivery attempt.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()>;
}

/// Builds senders from validated SMTP settings.
pub trait MailTransportProvider: Send + Sync {
    fn build(&self, config: &TransportConfig) -> anyhow::Result<Arc<dyn MailSender>>;
}

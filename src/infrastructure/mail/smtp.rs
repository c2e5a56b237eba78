use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use crate::{
    application::services::mail::{MailSender, MailTransportProvider},
    domain::models::{OutgoingEmail, TransportConfig, TransportSecurity},
};

/// Builds lettre SMTP transports. Port 465 connects over TLS directly, any
/// other port upgrades with STARTTLS when the server offers it.
pub struct SmtpTransportProvider {
    connect_timeout: Duration,
}

impl SmtpTransportProvider {
    pub fn new(connect_timeout: Duration) -> Arc<dyn MailTransportProvider> {
        Arc::new(Self { connect_timeout }) as Arc<dyn MailTransportProvider>
    }
}

impl MailTransportProvider for SmtpTransportProvider {
    fn build(&self, config: &TransportConfig) -> anyhow::Result<Arc<dyn MailSender>> {
        let tls_parameters = TlsParameters::new(config.host.clone())
            .with_context(|| format!("TLS configuration error for {}", config.host))?;
        let tls = match config.security() {
            TransportSecurity::ImplicitTls => Tls::Wrapper(tls_parameters),
            TransportSecurity::StartTls => Tls::Opportunistic(tls_parameters),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(self.connect_timeout))
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Arc::new(SmtpMailSender { transport }))
    }
}

pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        self.transport
            .send(message(email)?)
            .await
            .context("SMTP send failed")?;
        Ok(())
    }
}

fn message(email: &OutgoingEmail) -> anyhow::Result<Message> {
    let from_address: Address = email
        .from_address
        .parse()
        .with_context(|| format!("invalid sender address {}", email.from_address))?;
    let to: Mailbox = email
        .to
        .parse()
        .with_context(|| format!("invalid recipient address {}", email.to))?;

    Message::builder()
        .from(Mailbox::new(email.from_name.clone(), from_address))
        .to(to)
        .subject(&email.subject)
        .header(ContentType::TEXT_HTML)
        .body(email.html_body.clone())
        .context("failed to build message")
}

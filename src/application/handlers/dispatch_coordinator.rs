use std::time::Duration;

use chrono::Utc;
use futures::{StreamExt, stream};
use tokio::time::timeout;
use uuid::Uuid;

use crate::{
    application::services::{
        audit_trail::AuditTrail, personalizer, transport::ResolvedTransport,
    },
    domain::{
        events::AuditRecord,
        models::{Audience, DispatchOutcome, DispatchReport, MessageTemplate, OutgoingEmail, Recipient},
    },
};

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub max_concurrency: usize,
    pub send_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            send_timeout: Duration::from_secs(30),
        }
    }
}

/// Identifiers copied onto every history entry of one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext {
    pub project_id: Uuid,
    pub template_id: Uuid,
    pub job_id: Option<Uuid>,
}

pub struct DispatchCoordinator {
    audit: AuditTrail,
    settings: DispatchSettings,
}

impl DispatchCoordinator {
    pub fn new(audit: AuditTrail, settings: DispatchSettings) -> Self {
        Self { audit, settings }
    }

    /// Attempts every recipient once, at most `max_concurrency` at a time, and
    /// returns after all attempts have finished.
    pub async fn dispatch(
        &self,
        audience: &Audience,
        template: &MessageTemplate,
        transport: &ResolvedTransport,
        context: &DispatchContext,
    ) -> DispatchReport {
        let deliveries: Vec<_> = audience
            .values()
            .map(|recipient| self.deliver(recipient, template, transport, context))
            .collect();

        let outcomes: Vec<DispatchOutcome> = stream::iter(deliveries)
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        DispatchReport::from_outcomes(outcomes)
    }

    async fn deliver(
        &self,
        recipient: &Recipient,
        template: &MessageTemplate,
        transport: &ResolvedTransport,
        context: &DispatchContext,
    ) -> DispatchOutcome {
        let rendered = personalizer::render(template, &recipient.attributes);
        let email = OutgoingEmail {
            from_address: transport.config.sender_address.clone(),
            from_name: transport.config.display_name().map(str::to_string),
            to: recipient.email.to_string(),
            subject: rendered.subject,
            html_body: rendered.body,
        };

        let result = match timeout(self.settings.send_timeout, transport.sender.send(&email)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "send timed out after {}s",
                self.settings.send_timeout.as_secs()
            )),
        };

        match result {
            Ok(()) => {
                self.audit.record(AuditRecord {
                    id: Uuid::new_v4(),
                    project_id: context.project_id,
                    template_id: context.template_id,
                    job_id: context.job_id,
                    recipient: email.to.clone(),
                    subject: email.subject,
                    sender_address: email.from_address,
                    sender_name: email.from_name,
                    sent_at: Utc::now(),
                });
                DispatchOutcome::sent(email.to)
            }
            Err(err) => {
                tracing::warn!(
                    project_id = %context.project_id,
                    recipient = %email.to,
                    error = %err,
                    "email delivery failed"
                );
                DispatchOutcome::failed(email.to, err.to_string())
            }
        }
    }
}

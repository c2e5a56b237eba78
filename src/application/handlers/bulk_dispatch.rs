use uuid::Uuid;

use crate::{
    application::{
        handlers::dispatch_coordinator::{DispatchContext, DispatchCoordinator},
        services::{audience::AudienceResolver, transport::TransportResolver},
    },
    domain::{
        errors::DispatchError,
        models::{AudienceSource, DispatchReport, MessageTemplate, TransportRef},
    },
};

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub project_id: Uuid,
    pub template_id: Uuid,
    pub job_id: Option<Uuid>,
    pub transport: TransportRef,
    pub template: MessageTemplate,
    pub sources: Vec<AudienceSource>,
}

/// Shared engine behind both the immediate and the scheduled send paths.
pub struct BulkDispatchHandler {
    audience: AudienceResolver,
    transports: TransportResolver,
    coordinator: DispatchCoordinator,
}

impl BulkDispatchHandler {
    pub fn new(
        audience: AudienceResolver,
        transports: TransportResolver,
        coordinator: DispatchCoordinator,
    ) -> Self {
        Self {
            audience,
            transports,
            coordinator,
        }
    }

    /// Errors are returned only for problems found before the first send;
    /// per-recipient failures are part of the report.
    pub async fn handle(&self, request: DispatchRequest) -> Result<DispatchReport, DispatchError> {
        let audience = self
            .audience
            .resolve(request.project_id, &request.sources)
            .await?;
        let transport = self
            .transports
            .resolve(request.project_id, &request.transport)
            .await?;

        tracing::info!(
            project_id = %request.project_id,
            template_id = %request.template_id,
            job_id = ?request.job_id,
            recipients = audience.len(),
            "dispatching emails"
        );

        let context = DispatchContext {
            project_id: request.project_id,
            template_id: request.template_id,
            job_id: request.job_id,
        };
        let report = self
            .coordinator
            .dispatch(&audience, &request.template, &transport, &context)
            .await;

        tracing::info!(
            project_id = %request.project_id,
            job_id = ?request.job_id,
            sent = report.success_count,
            failed = report.fail_count,
            "dispatch finished"
        );

        Ok(report)
    }
}

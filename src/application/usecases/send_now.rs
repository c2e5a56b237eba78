use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::handlers::bulk_dispatch::{BulkDispatchHandler, DispatchRequest},
    domain::{
        errors::DispatchError,
        models::{AudienceSource, MessageTemplate, TransportRef},
    },
};

pub struct SendNowUseCase {
    handler: Arc<BulkDispatchHandler>,
}

pub struct SendNowRequest {
    pub project_id: Uuid,
    pub template_id: Uuid,
    pub transport_id: String,
    pub subject: String,
    pub body: String,
    pub audience_source_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendNowResponse {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

impl SendNowUseCase {
    pub fn new(handler: Arc<BulkDispatchHandler>) -> Self {
        Self { handler }
    }

    pub async fn execute(&self, request: SendNowRequest) -> Result<SendNowResponse, DispatchError> {
        let report = self
            .handler
            .handle(DispatchRequest {
                project_id: request.project_id,
                template_id: request.template_id,
                job_id: None,
                transport: TransportRef::parse(&request.transport_id),
                template: MessageTemplate::new(request.subject, request.body),
                sources: AudienceSource::parse_all(&request.audience_source_ids),
            })
            .await?;

        Ok(SendNowResponse {
            total: report.total,
            sent: report.success_count,
            failed: report.fail_count,
        })
    }
}

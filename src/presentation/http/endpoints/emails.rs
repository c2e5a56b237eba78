use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};
use uuid::Uuid;

use crate::{
    application::usecases::send_now::SendNowRequest,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{dispatch_error, map_send_response},
        requests::SendEmailsRequestDto,
        responses::SendEmailsResponseDto,
    },
};

#[derive(Clone)]
pub struct EmailsEndpoints {
    state: Arc<ApiState>,
}

impl EmailsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl EmailsEndpoints {
    /// Sends a personalized email to every recipient of the given audience
    /// sources and waits for all deliveries to finish.
    #[oai(
        path = "/projects/:project_id/emails/send",
        method = "post",
        tag = EndpointsTags::Emails,
    )]
    pub async fn send_emails(
        &self,
        project_id: Path<Uuid>,
        request: Json<SendEmailsRequestDto>,
    ) -> PoemResult<Json<SendEmailsResponseDto>> {
        let Json(request) = request;
        let payload = SendNowRequest {
            project_id: project_id.0,
            template_id: request.template_id,
            transport_id: request.transport_id,
            subject: request.subject,
            body: request.body,
            audience_source_ids: request.audience_source_ids,
        };

        let response = self
            .state
            .send_now_usecase
            .execute(payload)
            .await
            .map_err(dispatch_error)?;

        Ok(Json(map_send_response(response)))
    }
}

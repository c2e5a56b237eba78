use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, payload::Json};

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    mappers::{internal_error, map_batch_summary},
    responses::ProcessJobsResponseDto,
};

#[derive(Clone)]
pub struct JobsEndpoints {
    state: Arc<ApiState>,
}

impl JobsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl JobsEndpoints {
    /// Runs all scheduled jobs that are due now.
    #[oai(path = "/jobs/process", method = "post", tag = EndpointsTags::Jobs)]
    pub async fn process_jobs(&self) -> PoemResult<Json<ProcessJobsResponseDto>> {
        let summary = self
            .state
            .process_due_jobs_usecase
            .execute()
            .await
            .map_err(internal_error)?;

        Ok(Json(map_batch_summary(summary)))
    }
}

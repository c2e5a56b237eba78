use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::usecases::{
    process_due_jobs::ProcessDueJobsUseCase, send_now::SendNowUseCase,
};

#[derive(Clone)]
pub struct ApiState {
    pub send_now_usecase: Arc<SendNowUseCase>,
    pub process_due_jobs_usecase: Arc<ProcessDueJobsUseCase>,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Emails,
    Jobs,
}

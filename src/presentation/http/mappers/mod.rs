use poem::http::StatusCode;

use crate::{
    application::usecases::{process_due_jobs::BatchSummary, send_now::SendNowResponse},
    domain::errors::DispatchError,
    presentation::http::responses::{ProcessJobsResponseDto, SendEmailsResponseDto},
};

pub fn map_send_response(response: SendNowResponse) -> SendEmailsResponseDto {
    SendEmailsResponseDto {
        total: count(response.total),
        sent: count(response.sent),
        failed: count(response.failed),
    }
}

pub fn map_batch_summary(summary: BatchSummary) -> ProcessJobsResponseDto {
    ProcessJobsResponseDto {
        processed: count(summary.processed),
        sent: count(summary.sent),
        failed: count(summary.failed),
        unrecorded: count(summary.unrecorded),
        expired: count(summary.expired),
    }
}

/// Both transport errors read the same to API callers.
pub fn dispatch_error(err: DispatchError) -> poem::Error {
    match err {
        DispatchError::NoRecipients => {
            poem::Error::from_string("No recipients found", StatusCode::BAD_REQUEST)
        }
        DispatchError::Store(err) => internal_error(err),
        err => {
            tracing::info!(error = %err, "rejected send request");
            poem::Error::from_string(
                "SMTP configuration not found or invalid",
                StatusCode::BAD_REQUEST,
            )
        }
    }
}

pub fn internal_error(err: anyhow::Error) -> poem::Error {
    tracing::error!(error = %err, "request failed");
    poem::Error::from_string(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

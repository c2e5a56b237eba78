use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dispatch::DispatchReport;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "sent" => Some(JobStatus::Sent),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub project_id: Uuid,
    pub template_id: Uuid,
    pub transport_id: String,
    pub subject: String,
    pub body: String,
    pub audience_source_ids: Vec<String>,
    pub status: JobStatus,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal write for a job that went through `Processing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCompletion {
    pub status: JobStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Recorded on jobs left in `processing` past the stale threshold.
pub const INTERRUPTED_MESSAGE: &str = "Job interrupted before completion";

impl JobCompletion {
    /// Partial delivery still counts as a sent job; the failure count goes
    /// into the error message.
    pub fn from_report(report: &DispatchReport, now: DateTime<Utc>) -> Self {
        if report.success_count == 0 && report.fail_count > 0 {
            return Self::failed("All emails failed to send");
        }

        let error_message =
            (report.fail_count > 0).then(|| format!("{} emails failed to send", report.fail_count));

        Self {
            status: JobStatus::Sent,
            sent_at: Some(now),
            error_message,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            sent_at: None,
            error_message: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::models::DispatchOutcome;

    fn report(success: usize, failed: usize) -> DispatchReport {
        let outcomes = (0..success)
            .map(|i| DispatchOutcome::sent(format!("ok{i}@example.com")))
            .chain((0..failed).map(|i| DispatchOutcome::failed(format!("ko{i}@example.com"), "boom")))
            .collect();
        DispatchReport::from_outcomes(outcomes)
    }

    #[rstest]
    #[case(3, 0, JobStatus::Sent, None)]
    #[case(2, 1, JobStatus::Sent, Some("1 emails failed to send"))]
    #[case(1, 4, JobStatus::Sent, Some("4 emails failed to send"))]
    #[case(0, 3, JobStatus::Failed, Some("All emails failed to send"))]
    fn completion_follows_counts(
        #[case] success: usize,
        #[case] failed: usize,
        #[case] status: JobStatus,
        #[case] message: Option<&str>,
    ) {
        let now = Utc::now();
        let completion = JobCompletion::from_report(&report(success, failed), now);

        assert_eq!(completion.status, status);
        assert_eq!(completion.error_message.as_deref(), message);
        match status {
            JobStatus::Sent => assert_eq!(completion.sent_at, Some(now)),
            _ => assert_eq!(completion.sent_at, None),
        }
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Sent,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::from_str("queued"), None);
    }
}

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::{
    application::handlers::bulk_dispatch::{BulkDispatchHandler, DispatchRequest},
    domain::{
        models::{
            AudienceSource, INTERRUPTED_MESSAGE, JobCompletion, JobStatus, MessageTemplate,
            ScheduledJob, TransportRef,
        },
        repositories::ScheduledJobRepository,
    },
};

pub struct ProcessDueJobsUseCase {
    jobs: Arc<dyn ScheduledJobRepository>,
    handler: Arc<BulkDispatchHandler>,
    stale_after: Duration,
}

/// `processed` counts claimed jobs. Each of them lands in exactly one of
/// `sent`, `failed` or `unrecorded`; the last holds jobs whose final status
/// could not be written. `expired` counts jobs found stuck in `processing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub unrecorded: usize,
    pub expired: usize,
}

impl ProcessDueJobsUseCase {
    pub fn new(
        jobs: Arc<dyn ScheduledJobRepository>,
        handler: Arc<BulkDispatchHandler>,
        stale_after: Duration,
    ) -> Self {
        Self {
            jobs,
            handler,
            stale_after,
        }
    }

    /// Runs every due job, one after another. A failing job is recorded on
    /// the job and does not stop the batch.
    pub async fn execute(&self) -> anyhow::Result<BatchSummary> {
        let mut summary = BatchSummary {
            expired: self.expire_stale().await,
            ..BatchSummary::default()
        };

        let due = self.jobs.list_due(Utc::now()).await?;
        for job in due {
            match self.jobs.claim(job.id).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(job_id = %job.id, "job already taken, skipping");
                    continue;
                }
                Err(err) => {
                    tracing::error!(job_id = %job.id, error = %err, "failed to claim job");
                    continue;
                }
            }

            summary.processed += 1;
            match self.run(&job).await {
                Some(JobStatus::Sent) => summary.sent += 1,
                Some(_) => summary.failed += 1,
                None => summary.unrecorded += 1,
            }
        }

        if summary.processed > 0 || summary.expired > 0 {
            tracing::info!(
                processed = summary.processed,
                sent = summary.sent,
                failed = summary.failed,
                unrecorded = summary.unrecorded,
                expired = summary.expired,
                "scheduled batch finished"
            );
        }

        Ok(summary)
    }

    /// Fails jobs a previous run left in `processing`. They are never resent.
    async fn expire_stale(&self) -> usize {
        let Ok(stale_after) = chrono::Duration::from_std(self.stale_after) else {
            return 0;
        };
        let cutoff = Utc::now() - stale_after;

        match self.jobs.fail_stale(cutoff, INTERRUPTED_MESSAGE).await {
            Ok(count) => {
                if count > 0 {
                    tracing::warn!(count, "expired jobs stuck in processing");
                }
                usize::try_from(count).unwrap_or(usize::MAX)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to expire stale jobs");
                0
            }
        }
    }

    /// Returns the recorded final status, or `None` when it could not be
    /// written and the job is still `processing`.
    async fn run(&self, job: &ScheduledJob) -> Option<JobStatus> {
        let request = DispatchRequest {
            project_id: job.project_id,
            template_id: job.template_id,
            job_id: Some(job.id),
            transport: TransportRef::parse(&job.transport_id),
            template: MessageTemplate::new(job.subject.clone(), job.body.clone()),
            sources: AudienceSource::parse_all(&job.audience_source_ids),
        };

        let completion = match self.handler.handle(request).await {
            Ok(report) => JobCompletion::from_report(&report, Utc::now()),
            Err(err) => {
                tracing::warn!(job_id = %job.id, error = %err, "scheduled job failed before sending");
                JobCompletion::failed(err.to_string())
            }
        };

        let status = completion.status;
        match self.jobs.complete(job.id, completion).await {
            Ok(()) => Some(status),
            Err(err) => {
                tracing::error!(
                    job_id = %job.id,
                    status = status.as_str(),
                    error = %err,
                    "failed to record job result"
                );
                None
            }
        }
    }
}

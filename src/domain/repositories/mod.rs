use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    events::AuditRecord,
    models::{Contact, Form, FormSubmission, JobCompletion, ScheduledJob, StoredTransport},
};

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn list_by_lists(
        &self,
        project_id: Uuid,
        list_ids: &[String],
    ) -> anyhow::Result<Vec<Contact>>;
}

#[async_trait]
pub trait FormRepository: Send + Sync {
    async fn list_forms(&self, project_id: Uuid) -> anyhow::Result<Vec<Form>>;

    async fn list_submissions(
        &self,
        project_id: Uuid,
        form_ids: &[Uuid],
    ) -> anyhow::Result<Vec<FormSubmission>>;
}

#[async_trait]
pub trait TransportConfigRepository: Send + Sync {
    async fn find_shared(&self, id: &str) -> anyhow::Result<Option<StoredTransport>>;

    /// Only settings belonging to `project_id` are visible.
    async fn find_owned(
        &self,
        project_id: Uuid,
        id: &str,
    ) -> anyhow::Result<Option<StoredTransport>>;
}

#[async_trait]
pub trait ScheduledJobRepository: Send + Sync {
    /// Pending jobs with `scheduled_at <= now`, oldest first.
    async fn list_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledJob>>;

    /// Moves a job from `pending` to `processing`. Returns `false` when the job
    /// is no longer pending.
    async fn claim(&self, job_id: Uuid) -> anyhow::Result<bool>;

    async fn complete(&self, job_id: Uuid, completion: JobCompletion) -> anyhow::Result<()>;

    /// Marks jobs still `processing` since before `cutoff` as failed with
    /// `reason`. Returns how many were changed.
    async fn fail_stale(&self, cutoff: DateTime<Utc>, reason: &str) -> anyhow::Result<u64>;

    async fn get(&self, job_id: Uuid) -> anyhow::Result<Option<ScheduledJob>>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn insert(&self, record: &AuditRecord) -> anyhow::Result<()>;
}

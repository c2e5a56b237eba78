use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    events::AuditRecord,
    models::{
        Contact, Form, FormSubmission, JobCompletion, JobStatus, ScheduledJob, StoredTransport,
    },
    repositories::{
        AuditLogRepository, ContactRepository, FormRepository, ScheduledJobRepository,
        TransportConfigRepository,
    },
};

#[derive(Default)]
pub struct InMemoryContactRepository {
    contacts: Arc<RwLock<Vec<Contact>>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, contact: Contact) {
        self.contacts.write().await.push(contact);
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn list_by_lists(
        &self,
        project_id: Uuid,
        list_ids: &[String],
    ) -> anyhow::Result<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .iter()
            .filter(|c| c.project_id == project_id && list_ids.contains(&c.list_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryFormRepository {
    forms: Arc<RwLock<Vec<Form>>>,
    submissions: Arc<RwLock<Vec<FormSubmission>>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_form(&self, project_id: Uuid, name: &str) -> Uuid {
        let form = Form {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
        };
        let id = form.id;
        self.forms.write().await.push(form);
        id
    }

    pub async fn add_submission(&self, form_id: Uuid, data: Map<String, Value>) {
        self.submissions.write().await.push(FormSubmission {
            id: Uuid::new_v4(),
            form_id,
            data,
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn list_forms(&self, project_id: Uuid) -> anyhow::Result<Vec<Form>> {
        let forms = self.forms.read().await;
        Ok(forms
            .iter()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_submissions(
        &self,
        project_id: Uuid,
        form_ids: &[Uuid],
    ) -> anyhow::Result<Vec<FormSubmission>> {
        let owned: HashSet<Uuid> = self
            .forms
            .read()
            .await
            .iter()
            .filter(|f| f.project_id == project_id && form_ids.contains(&f.id))
            .map(|f| f.id)
            .collect();
        let submissions = self.submissions.read().await;
        Ok(submissions
            .iter()
            .filter(|s| owned.contains(&s.form_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTransportConfigRepository {
    shared: Arc<RwLock<HashMap<String, StoredTransport>>>,
    owned: Arc<RwLock<HashMap<(Uuid, String), StoredTransport>>>,
}

impl InMemoryTransportConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_shared(&self, transport: StoredTransport) {
        self.shared
            .write()
            .await
            .insert(transport.id.clone(), transport);
    }

    pub async fn add_owned(&self, project_id: Uuid, transport: StoredTransport) {
        self.owned
            .write()
            .await
            .insert((project_id, transport.id.clone()), transport);
    }
}

#[async_trait]
impl TransportConfigRepository for InMemoryTransportConfigRepository {
    async fn find_shared(&self, id: &str) -> anyhow::Result<Option<StoredTransport>> {
        Ok(self.shared.read().await.get(id).cloned())
    }

    async fn find_owned(
        &self,
        project_id: Uuid,
        id: &str,
    ) -> anyhow::Result<Option<StoredTransport>> {
        Ok(self
            .owned
            .read()
            .await
            .get(&(project_id, id.to_string()))
            .cloned())
    }
}

/// Job store that can be told to reject terminal writes for given jobs.
#[derive(Default)]
pub struct InMemoryScheduledJobRepository {
    jobs: Arc<RwLock<HashMap<Uuid, ScheduledJob>>>,
    rejected: RwLock<HashSet<Uuid>>,
}

impl InMemoryScheduledJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: ScheduledJob) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn reject_completion(&self, job_id: Uuid) {
        self.rejected.write().await.insert(job_id);
    }
}

#[async_trait]
impl ScheduledJobRepository for InMemoryScheduledJobRepository {
    async fn list_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledJob>> {
        let jobs = self.jobs.read().await;
        let mut due: Vec<ScheduledJob> = jobs
            .values()
            .filter(|j| j.status == JobStatus::Pending && j.scheduled_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|j| j.scheduled_at);
        Ok(due)
    }

    async fn claim(&self, job_id: Uuid) -> anyhow::Result<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Processing;
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, job_id: Uuid, completion: JobCompletion) -> anyhow::Result<()> {
        if self.rejected.read().await.contains(&job_id) {
            anyhow::bail!("job store rejected completion of {job_id}");
        }
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = completion.status;
            job.sent_at = completion.sent_at;
            job.error_message = completion.error_message;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn fail_stale(&self, cutoff: DateTime<Utc>, reason: &str) -> anyhow::Result<u64> {
        let mut jobs = self.jobs.write().await;
        let mut changed = 0;
        for job in jobs
            .values_mut()
            .filter(|j| j.status == JobStatus::Processing && j.updated_at < cutoff)
        {
            job.status = JobStatus::Failed;
            job.error_message = Some(reason.to_string());
            job.updated_at = Utc::now();
            changed += 1;
        }
        Ok(changed)
    }

    async fn get(&self, job_id: Uuid) -> anyhow::Result<Option<ScheduledJob>> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }
}

/// History log that can be told to reject inserts for given recipients.
#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    rejected: HashSet<String>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: Arc::default(),
            rejected: recipients.into_iter().map(Into::into).collect(),
        }
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn insert(&self, record: &AuditRecord) -> anyhow::Result<()> {
        if self.rejected.contains(&record.recipient) {
            anyhow::bail!("history store rejected {}", record.recipient);
        }
        self.records.write().await.push(record.clone());
        Ok(())
    }
}

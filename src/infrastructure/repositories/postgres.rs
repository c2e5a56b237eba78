use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, Pool, Postgres, types::Json};
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

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct PostgresContactRepository {
    pool: PgPool,
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    async fn list_by_lists(
        &self,
        project_id: Uuid,
        list_ids: &[String],
    ) -> anyhow::Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, ContactRecord>(
            r#"
            SELECT id, project_id, list_id, email, name, custom_fields
            FROM contacts
            WHERE project_id = $1
              AND list_id = ANY($2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .bind(list_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Contact::from).collect())
    }
}

#[derive(Clone)]
pub struct PostgresFormRepository {
    pool: PgPool,
}

impl PostgresFormRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl FormRepository for PostgresFormRepository {
    async fn list_forms(&self, project_id: Uuid) -> anyhow::Result<Vec<Form>> {
        let rows = sqlx::query_as::<_, FormRecord>(
            r#"SELECT id, project_id, name FROM forms WHERE project_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Form::from).collect())
    }

    async fn list_submissions(
        &self,
        project_id: Uuid,
        form_ids: &[Uuid],
    ) -> anyhow::Result<Vec<FormSubmission>> {
        let rows = sqlx::query_as::<_, SubmissionRecord>(
            r#"
            SELECT s.id, s.form_id, s.data, s.created_at
            FROM form_submissions s
            JOIN forms f ON f.id = s.form_id
            WHERE f.project_id = $1
              AND s.form_id = ANY($2)
            ORDER BY s.created_at ASC
            "#,
        )
        .bind(project_id)
        .bind(form_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FormSubmission::from).collect())
    }
}

#[derive(Clone)]
pub struct PostgresTransportConfigRepository {
    pool: PgPool,
}

impl PostgresTransportConfigRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl TransportConfigRepository for PostgresTransportConfigRepository {
    async fn find_shared(&self, id: &str) -> anyhow::Result<Option<StoredTransport>> {
        let record = sqlx::query_as::<_, TransportRecord>(
            r#"
            SELECT id, host, port, username, password, from_email, from_name
            FROM admin_smtp_configs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(StoredTransport::from))
    }

    async fn find_owned(
        &self,
        project_id: Uuid,
        id: &str,
    ) -> anyhow::Result<Option<StoredTransport>> {
        let record = sqlx::query_as::<_, TransportRecord>(
            r#"
            SELECT id, host, port, username, password, from_email, from_name
            FROM smtp_configs
            WHERE id = $1 AND project_id = $2
            "#,
        )
        .bind(id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(StoredTransport::from))
    }
}

#[derive(Clone)]
pub struct PostgresScheduledJobRepository {
    pool: PgPool,
}

impl PostgresScheduledJobRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

const JOB_COLUMNS: &str = r#"
    id, project_id, template_id, transport_id, subject, body, audience_source_ids,
    status, scheduled_at, sent_at, error_message, created_at, updated_at
"#;

#[async_trait]
impl ScheduledJobRepository for PostgresScheduledJobRepository {
    async fn list_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledJob>> {
        let rows = sqlx::query_as::<_, JobRecord>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM scheduled_emails
            WHERE status = 'pending'
              AND scheduled_at <= $1
            ORDER BY scheduled_at ASC
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn claim(&self, job_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_emails
            SET status = 'processing',
                updated_at = $2
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(job_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn complete(&self, job_id: Uuid, completion: JobCompletion) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE scheduled_emails
            SET status = $2,
                sent_at = $3,
                error_message = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(completion.status.as_str())
        .bind(completion.sent_at)
        .bind(completion.error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail_stale(&self, cutoff: DateTime<Utc>, reason: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_emails
            SET status = 'failed',
                error_message = $2,
                updated_at = $3
            WHERE status = 'processing'
              AND updated_at < $1
            "#,
        )
        .bind(cutoff)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn get(&self, job_id: Uuid) -> anyhow::Result<Option<ScheduledJob>> {
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM scheduled_emails WHERE id = $1"#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }
}

#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn insert(&self, record: &AuditRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO email_history (
                id, project_id, template_id, job_id, recipient, subject,
                sender_address, sender_name, sent_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            "#,
        )
        .bind(record.id)
        .bind(record.project_id)
        .bind(record.template_id)
        .bind(record.job_id)
        .bind(&record.recipient)
        .bind(&record.subject)
        .bind(&record.sender_address)
        .bind(&record.sender_name)
        .bind(record.sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct ContactRecord {
    id: Uuid,
    project_id: Uuid,
    list_id: String,
    email: String,
    name: Option<String>,
    custom_fields: Json<Map<String, Value>>,
}

impl From<ContactRecord> for Contact {
    fn from(value: ContactRecord) -> Self {
        Self {
            id: value.id,
            project_id: value.project_id,
            list_id: value.list_id,
            email: value.email,
            name: value.name,
            custom_fields: value.custom_fields.0,
        }
    }
}

#[derive(FromRow)]
struct FormRecord {
    id: Uuid,
    project_id: Uuid,
    name: String,
}

impl From<FormRecord> for Form {
    fn from(value: FormRecord) -> Self {
        Self {
            id: value.id,
            project_id: value.project_id,
            name: value.name,
        }
    }
}

#[derive(FromRow)]
struct SubmissionRecord {
    id: Uuid,
    form_id: Uuid,
    data: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
}

impl From<SubmissionRecord> for FormSubmission {
    fn from(value: SubmissionRecord) -> Self {
        Self {
            id: value.id,
            form_id: value.form_id,
            data: value.data.0,
            created_at: value.created_at,
        }
    }
}

#[derive(FromRow)]
struct TransportRecord {
    id: String,
    host: Option<String>,
    port: Option<i32>,
    username: Option<String>,
    password: Option<String>,
    from_email: Option<String>,
    from_name: Option<String>,
}

impl From<TransportRecord> for StoredTransport {
    fn from(value: TransportRecord) -> Self {
        Self {
            id: value.id,
            host: value.host,
            // out-of-range ports count as unset
            port: value.port.and_then(|p| u16::try_from(p).ok()),
            username: value.username,
            password: value.password,
            from_email: value.from_email,
            from_name: value.from_name,
        }
    }
}

#[derive(FromRow)]
struct JobRecord {
    id: Uuid,
    project_id: Uuid,
    template_id: Uuid,
    transport_id: String,
    subject: String,
    body: String,
    audience_source_ids: Vec<String>,
    status: String,
    scheduled_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRecord> for ScheduledJob {
    type Error = anyhow::Error;

    fn try_from(value: JobRecord) -> Result<Self, Self::Error> {
        let status = JobStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown job status {}", value.status))?;
        Ok(Self {
            id: value.id,
            project_id: value.project_id,
            template_id: value.template_id,
            transport_id: value.transport_id,
            subject: value.subject,
            body: value.body,
            audience_source_ids: value.audience_source_ids,
            status,
            scheduled_at: value.scheduled_at,
            sent_at: value.sent_at,
            error_message: value.error_message,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

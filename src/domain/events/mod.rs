use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// History entry for one delivered email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub template_id: Uuid,
    pub job_id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub sender_address: String,
    pub sender_name: Option<String>,
    pub sent_at: DateTime<Utc>,
}

use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::domain::{events::AuditRecord, repositories::AuditLogRepository};

/// Sending half of the delivery history channel.
///
/// Recording never waits and never reports failure to the caller. When the
/// buffer is full or the writer is gone the entry is logged and dropped; a
/// failed insert is logged by the writer.
#[derive(Clone)]
pub struct AuditTrail {
    tx: mpsc::Sender<AuditRecord>,
}

impl AuditTrail {
    /// Starts the writer task. It exits once every `AuditTrail` clone is
    /// dropped and the buffer is drained.
    pub fn spawn(repo: Arc<dyn AuditLogRepository>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = AuditWriter { repo, rx };
        (Self { tx }, tokio::spawn(writer.run()))
    }

    pub fn record(&self, record: AuditRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => tracing::warn!(
                recipient = %record.recipient,
                project_id = %record.project_id,
                "audit buffer is full, history entry dropped"
            ),
            Err(TrySendError::Closed(record)) => tracing::warn!(
                recipient = %record.recipient,
                project_id = %record.project_id,
                "audit writer is gone, history entry dropped"
            ),
        }
    }
}

struct AuditWriter {
    repo: Arc<dyn AuditLogRepository>,
    rx: mpsc::Receiver<AuditRecord>,
}

impl AuditWriter {
    async fn run(mut self) {
        while let Some(record) = self.rx.recv().await {
            if let Err(err) = self.repo.insert(&record).await {
                tracing::warn!(
                    recipient = %record.recipient,
                    project_id = %record.project_id,
                    error = %err,
                    "failed to write email history"
                );
            }
        }
        tracing::debug!("audit writer stopped");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::infrastructure::repositories::in_memory::InMemoryAuditLogRepository;

    fn record(recipient: &str) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            job_id: None,
            recipient: recipient.to_string(),
            subject: "Hello".to_string(),
            sender_address: "news@example.com".to_string(),
            sender_name: None,
            sent_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_are_written_in_order() {
        let repo = Arc::new(InMemoryAuditLogRepository::new());
        let (trail, writer) = AuditTrail::spawn(repo.clone(), 4);

        trail.record(record("a@x.com"));
        trail.record(record("b@x.com"));
        drop(trail);
        writer.await.unwrap();

        let recipients: Vec<_> = repo.records().await.into_iter().map(|r| r.recipient).collect();
        assert_eq!(recipients, vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn buffered_entries_are_flushed_after_last_sender_drops() {
        let repo = Arc::new(InMemoryAuditLogRepository::new());
        let (trail, writer) = AuditTrail::spawn(repo.clone(), 8);
        let second = trail.clone();

        // Nothing yields here, so all three sit in the buffer.
        trail.record(record("a@x.com"));
        second.record(record("b@x.com"));
        trail.record(record("c@x.com"));
        drop(trail);
        drop(second);
        writer.await.unwrap();

        assert_eq!(repo.records().await.len(), 3);
    }

    #[tokio::test]
    async fn insert_failures_do_not_stop_the_writer() {
        let repo = Arc::new(InMemoryAuditLogRepository::failing_for(["a@x.com"]));
        let (trail, writer) = AuditTrail::spawn(repo.clone(), 4);

        trail.record(record("a@x.com"));
        trail.record(record("b@x.com"));
        drop(trail);
        writer.await.unwrap();

        let records = repo.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recipient, "b@x.com");
    }

    struct StalledAuditLog;

    #[async_trait::async_trait]
    impl AuditLogRepository for StalledAuditLog {
        async fn insert(&self, _record: &AuditRecord) -> anyhow::Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn full_buffer_drops_instead_of_waiting() {
        let (trail, _writer) = AuditTrail::spawn(Arc::new(StalledAuditLog), 1);

        let recorded = tokio::time::timeout(std::time::Duration::from_secs(1), async {
            for n in 0..10 {
                trail.record(record(&format!("{n}@x.com")));
                tokio::task::yield_now().await;
            }
        })
        .await;

        assert!(recorded.is_ok());
    }

    #[tokio::test]
    async fn closed_writer_is_ignored() {
        let (trail, writer) = AuditTrail::spawn(Arc::new(InMemoryAuditLogRepository::new()), 1);
        writer.abort();
        let _ = writer.await;

        trail.record(record("a@x.com"));
    }
}

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::services::mail::{MailSender, MailTransportProvider},
    domain::{
        errors::DispatchError,
        models::{TransportConfig, TransportRef},
        repositories::TransportConfigRepository,
    },
};

/// Validated settings together with a sender built from them.
#[derive(Clone)]
pub struct ResolvedTransport {
    pub config: TransportConfig,
    pub sender: Arc<dyn MailSender>,
}

pub struct TransportResolver {
    repo: Arc<dyn TransportConfigRepository>,
    provider: Arc<dyn MailTransportProvider>,
}

impl TransportResolver {
    pub fn new(
        repo: Arc<dyn TransportConfigRepository>,
        provider: Arc<dyn MailTransportProvider>,
    ) -> Self {
        Self { repo, provider }
    }

    /// Owned settings are looked up within `project_id` only.
    pub async fn config(
        &self,
        project_id: Uuid,
        transport: &TransportRef,
    ) -> Result<TransportConfig, DispatchError> {
        let stored = match transport {
            TransportRef::Shared(id) => self.repo.find_shared(id).await?,
            TransportRef::Owned(id) => self.repo.find_owned(project_id, id).await?,
        }
        .ok_or_else(|| DispatchError::TransportNotFound(transport.id().to_string()))?;

        TransportConfig::try_from(stored)
    }

    pub async fn resolve(
        &self,
        project_id: Uuid,
        transport: &TransportRef,
    ) -> Result<ResolvedTransport, DispatchError> {
        let config = self.config(project_id, transport).await?;
        let sender = self.provider.build(&config)?;

        tracing::debug!(
            host = %config.host,
            port = config.port,
            security = ?config.security(),
            "transport resolved"
        );

        Ok(ResolvedTransport { config, sender })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::models::StoredTransport,
        infrastructure::{
            mail::recording::RecordingTransportProvider,
            repositories::in_memory::InMemoryTransportConfigRepository,
        },
    };

    fn stored(id: &str, host: &str) -> StoredTransport {
        StoredTransport {
            id: id.to_string(),
            host: Some(host.to_string()),
            port: Some(587),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            from_email: Some("news@example.com".to_string()),
            from_name: None,
        }
    }

    const PROJECT: Uuid = Uuid::from_u128(1);
    const OTHER_PROJECT: Uuid = Uuid::from_u128(2);

    async fn resolver() -> (TransportResolver, Arc<RecordingTransportProvider>) {
        let repo = Arc::new(InMemoryTransportConfigRepository::new());
        repo.add_shared(stored("main", "shared.example.com")).await;
        repo.add_owned(PROJECT, stored("main", "owned.example.com")).await;
        repo.add_owned(
            PROJECT,
            StoredTransport {
                username: None,
                ..stored("broken", "owned.example.com")
            },
        )
        .await;
        repo.add_owned(OTHER_PROJECT, stored("private", "other.example.com"))
            .await;
        let provider = Arc::new(RecordingTransportProvider::new());
        (TransportResolver::new(repo, provider.clone()), provider)
    }

    #[tokio::test]
    async fn scope_selects_store() {
        let (resolver, _) = resolver().await;

        let shared = resolver
            .config(PROJECT, &TransportRef::parse("admin_main"))
            .await
            .unwrap();
        assert_eq!(shared.host, "shared.example.com");

        let owned = resolver
            .config(PROJECT, &TransportRef::parse("main"))
            .await
            .unwrap();
        assert_eq!(owned.host, "owned.example.com");
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let (resolver, provider) = resolver().await;

        let err = resolver
            .resolve(PROJECT, &TransportRef::parse("admin_broken"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, DispatchError::TransportNotFound(id) if id == "broken"));
        assert_eq!(provider.built(), 0);
    }

    #[tokio::test]
    async fn another_projects_settings_are_not_found() {
        let (resolver, provider) = resolver().await;

        let err = resolver
            .resolve(PROJECT, &TransportRef::parse("private"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, DispatchError::TransportNotFound(id) if id == "private"));
        assert_eq!(provider.built(), 0);

        let own = resolver
            .config(OTHER_PROJECT, &TransportRef::parse("private"))
            .await
            .unwrap();
        assert_eq!(own.host, "other.example.com");
    }

    #[tokio::test]
    async fn incomplete_record_is_invalid() {
        let (resolver, provider) = resolver().await;

        let err = resolver
            .resolve(PROJECT, &TransportRef::parse("broken"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, DispatchError::TransportInvalid { field: "username", .. }));
        assert_eq!(provider.built(), 0);
    }

    #[tokio::test]
    async fn resolve_builds_sender() {
        let (resolver, provider) = resolver().await;

        let resolved = resolver
            .resolve(PROJECT, &TransportRef::parse("main"))
            .await
            .unwrap();

        assert_eq!(resolved.config.sender_address, "news@example.com");
        assert_eq!(provider.built(), 1);
    }
}

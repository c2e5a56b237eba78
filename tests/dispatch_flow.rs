use std::sync::Arc;

use mailout::{
    application::{
        handlers::{
            bulk_dispatch::BulkDispatchHandler,
            dispatch_coordinator::{DispatchCoordinator, DispatchSettings},
        },
        services::{
            audience::AudienceResolver, audit_trail::AuditTrail, transport::TransportResolver,
        },
        usecases::send_now::{SendNowRequest, SendNowResponse, SendNowUseCase},
    },
    domain::{errors::DispatchError, models::Contact, models::StoredTransport},
    infrastructure::{
        mail::recording::RecordingTransportProvider,
        repositories::in_memory::{
            InMemoryAuditLogRepository, InMemoryContactRepository, InMemoryFormRepository,
            InMemoryTransportConfigRepository,
        },
    },
};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

struct App {
    project_id: Uuid,
    usecase: SendNowUseCase,
    provider: RecordingTransportProvider,
    history: Arc<InMemoryAuditLogRepository>,
    writer: tokio::task::JoinHandle<()>,
}

async fn app() -> App {
    let project_id = Uuid::new_v4();

    let contacts = Arc::new(InMemoryContactRepository::new());
    contacts
        .add(Contact {
            id: Uuid::new_v4(),
            project_id,
            list_id: "L1".to_string(),
            email: "a@x.com".to_string(),
            name: Some("Ann".to_string()),
            custom_fields: Default::default(),
        })
        .await;

    let forms = Arc::new(InMemoryFormRepository::new());
    let form_id = forms.add_form(project_id, "Signup").await;
    forms
        .add_submission(
            form_id,
            json!({"Email": "B@X.com", "Name": "Bob"})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .await;

    let transports = Arc::new(InMemoryTransportConfigRepository::new());
    let transport = StoredTransport {
        id: "s1".to_string(),
        host: Some("smtp.example.com".to_string()),
        port: None,
        username: Some("news@example.com".to_string()),
        password: Some("secret".to_string()),
        from_email: None,
        from_name: Some("News, Weekly".to_string()),
    };
    transports.add_owned(project_id, transport.clone()).await;
    transports
        .add_owned(
            Uuid::new_v4(),
            StoredTransport {
                id: "foreign".to_string(),
                ..transport
            },
        )
        .await;

    let provider = RecordingTransportProvider::new();
    let history = Arc::new(InMemoryAuditLogRepository::new());
    let (audit, writer) = AuditTrail::spawn(history.clone(), 8);

    let handler = BulkDispatchHandler::new(
        AudienceResolver::new(contacts, forms),
        TransportResolver::new(transports, Arc::new(provider.clone())),
        DispatchCoordinator::new(audit, DispatchSettings::default()),
    );

    App {
        project_id,
        usecase: SendNowUseCase::new(Arc::new(handler)),
        provider,
        history,
        writer,
    }
}

fn request(project_id: Uuid, sources: &[&str]) -> SendNowRequest {
    SendNowRequest {
        project_id,
        template_id: Uuid::new_v4(),
        transport_id: "s1".to_string(),
        subject: "Hi {{name}}".to_string(),
        body: "<p>{{email}}</p>".to_string(),
        audience_source_ids: sources.iter().map(|id| id.to_string()).collect(),
    }
}

#[tokio::test]
async fn contacts_and_leads_receive_personalized_mail() {
    let app = app().await;

    let response = app
        .usecase
        .execute(request(app.project_id, &["L1", "form_Signup"]))
        .await
        .unwrap();

    assert_eq!(
        response,
        SendNowResponse {
            total: 2,
            sent: 2,
            failed: 0
        }
    );

    let mut sent = app.provider.sent();
    sent.sort_by(|a, b| a.to.cmp(&b.to));
    let delivered: Vec<_> = sent
        .iter()
        .map(|email| (email.to.as_str(), email.subject.as_str(), email.html_body.as_str()))
        .collect();
    assert_eq!(
        delivered,
        vec![
            ("a@x.com", "Hi Ann", "<p>a@x.com</p>"),
            ("b@x.com", "Hi Bob", "<p>b@x.com</p>"),
        ]
    );
    for email in &sent {
        assert_eq!(email.from_address, "news@example.com");
        assert_eq!(email.from_name.as_deref(), Some("News, Weekly"));
    }

    drop(app.usecase);
    app.writer.await.unwrap();

    let mut recipients: Vec<_> = app
        .history
        .records()
        .await
        .into_iter()
        .map(|record| (record.recipient, record.subject, record.job_id))
        .collect();
    recipients.sort();
    assert_eq!(
        recipients,
        vec![
            ("a@x.com".to_string(), "Hi Ann".to_string(), None),
            ("b@x.com".to_string(), "Hi Bob".to_string(), None),
        ]
    );
}

#[tokio::test]
async fn empty_audience_is_rejected_before_any_send() {
    let app = app().await;

    let err = app
        .usecase
        .execute(request(app.project_id, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::NoRecipients));
    assert_eq!(app.provider.built(), 0);
    assert!(app.provider.sent().is_empty());
}

#[tokio::test]
async fn unknown_transport_is_rejected() {
    let app = app().await;

    let mut payload = request(app.project_id, &["L1"]);
    payload.transport_id = "admin_s1".to_string();
    let err = app.usecase.execute(payload).await.unwrap_err();

    assert!(matches!(err, DispatchError::TransportNotFound(id) if id == "s1"));
    assert!(app.provider.sent().is_empty());
}

#[tokio::test]
async fn another_projects_transport_is_not_usable() {
    let app = app().await;

    let mut payload = request(app.project_id, &["L1"]);
    payload.transport_id = "foreign".to_string();
    let err = app.usecase.execute(payload).await.unwrap_err();

    assert!(matches!(err, DispatchError::TransportNotFound(id) if id == "foreign"));
    assert_eq!(app.provider.built(), 0);
}

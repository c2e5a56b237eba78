use std::io::Error;
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
        usecases::{process_due_jobs::ProcessDueJobsUseCase, send_now::SendNowUseCase},
    },
    config::{Config, MailBackend},
    infrastructure::{
        mail::{log::LogTransportProvider, smtp::SmtpTransportProvider},
        repositories::postgres::{
            PostgresAuditLogRepository, PostgresContactRepository, PostgresFormRepository,
            PostgresScheduledJobRepository, PostgresTransportConfigRepository,
        },
        scheduler::JobScheduler,
    },
    presentation::http::endpoints::{
        emails::EmailsEndpoints, health::HealthEndpoints, jobs::JobsEndpoints, root::ApiState,
    },
};
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing_subscriber::EnvFilter;

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::try_parse().map_err(Error::other)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(Error::other)?;
    sqlx::migrate!().run(&pool).await.map_err(Error::other)?;

    let provider = match config.mail_backend {
        MailBackend::Smtp => SmtpTransportProvider::new(config.smtp_connect_timeout),
        MailBackend::Log => LogTransportProvider::new(),
    };

    let (audit, audit_writer) =
        AuditTrail::spawn(PostgresAuditLogRepository::new(pool.clone()), config.audit_buffer);

    let handler = Arc::new(BulkDispatchHandler::new(
        AudienceResolver::new(
            PostgresContactRepository::new(pool.clone()),
            PostgresFormRepository::new(pool.clone()),
        ),
        TransportResolver::new(PostgresTransportConfigRepository::new(pool.clone()), provider),
        DispatchCoordinator::new(
            audit,
            DispatchSettings {
                max_concurrency: config.dispatch_concurrency,
                send_timeout: config.send_timeout,
            },
        ),
    ));

    let process_due_jobs_usecase = Arc::new(ProcessDueJobsUseCase::new(
        PostgresScheduledJobRepository::new(pool.clone()),
        handler.clone(),
        config.stale_job_after,
    ));

    let scheduler = config
        .scheduler_interval
        .map(|interval| JobScheduler::new(interval).spawn(process_due_jobs_usecase.clone()));

    let state = Arc::new(ApiState {
        send_now_usecase: Arc::new(SendNowUseCase::new(handler)),
        process_due_jobs_usecase,
    });

    let server_url = config.server_url();

    tracing::info!(%server_url, backend = ?config.mail_backend, "starting server");

    let api_service = OpenApiService::new(
        (
            HealthEndpoints,
            EmailsEndpoints::new(state.clone()),
            JobsEndpoints::new(state),
        ),
        "Mailout API",
        "0.1.0",
    )
    .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    let served = Server::new(TcpListener::bind(format!("localhost:{}", config.port)))
        .run_with_graceful_shutdown(
            app,
            async {
                let _ = tokio::signal::ctrl_c().await;
            },
            Some(config.shutdown_grace),
        )
        .await;

    if let Some(scheduler) = scheduler {
        scheduler.abort();
        let _ = scheduler.await;
    }

    // The writer stops once every sender is dropped and the buffer is empty.
    match tokio::time::timeout(config.shutdown_grace, audit_writer).await {
        Ok(_) => tracing::info!("email history flushed"),
        Err(_) => tracing::warn!("email history not fully flushed before shutdown"),
    }

    served
}

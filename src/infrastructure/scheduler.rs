use std::sync::Arc;
use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_stream::{StreamExt, wrappers::IntervalStream};

use crate::application::usecases::process_due_jobs::ProcessDueJobsUseCase;

/// Polls for due scheduled jobs on a fixed interval.
pub struct JobScheduler {
    interval: Duration,
}

impl JobScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn spawn(self, usecase: Arc<ProcessDueJobsUseCase>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(usecase).await })
    }

    async fn run(self, usecase: Arc<ProcessDueJobsUseCase>) {
        let mut interval = tokio::time::interval(self.interval);
        // A slow batch must not trigger a burst of catch-up runs.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        tracing::info!(interval_secs = self.interval.as_secs(), "job scheduler started");

        while ticks.next().await.is_some() {
            if let Err(err) = usecase.execute().await {
                tracing::error!(error = %err, "failed to process scheduled jobs");
            }
        }
    }
}

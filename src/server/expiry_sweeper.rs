use crate::application_port::ContactService;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically moves overdue pending contact requests to `expired`.
pub struct ExpirySweeper {
    contact_service: Arc<dyn ContactService>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(
        contact_service: Arc<dyn ContactService>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            contact_service,
            interval,
            cancellation_token,
        }
    }

    async fn tick_once(&self) -> anyhow::Result<usize> {
        let expired = self.contact_service.expire_stale(Utc::now()).await?;
        Ok(expired)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("ExpirySweeper shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick_once().await {
                        Ok(0) => {}
                        Ok(n) => tracing::debug!(expired = n, "sweep finished"),
                        Err(e) => tracing::error!("ExpirySweeper error: {e:#}"),
                    }
                }
            }
        }
        Ok(())
    }
}

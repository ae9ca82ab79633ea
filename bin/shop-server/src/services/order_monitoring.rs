use crate::services::order_manager::{OrderManager, OrderManagerError};
use snafu::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info};

#[derive(Debug, Snafu)]
pub enum MonitoringError {
    #[snafu(display("Order expiry failed: {}", source))]
    Expiry { source: OrderManagerError },
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;

/// Background service that cancels orders left unpaid for longer than the
/// configured time to live.
pub struct OrderMonitoringService {
    order_manager: Arc<OrderManager>,
    interval: Duration,
    pending_ttl: chrono::Duration,
}

impl OrderMonitoringService {
    #[must_use]
    pub fn new(
        order_manager: Arc<OrderManager>,
        interval: Duration,
        pending_ttl: chrono::Duration,
    ) -> Self {
        Self {
            order_manager,
            interval,
            pending_ttl,
        }
    }

    /// Start the monitoring loop. Failed sweeps are logged and retried on
    /// the next tick; the loop itself never returns.
    pub async fn run(self: Arc<Self>) -> MonitoringResult<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            ttl_minutes = self.pending_ttl.num_minutes(),
            "Starting order monitoring service"
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(e) = self.expire_pending_orders().await {
                error!("Error monitoring orders: {}", e);
            }
        }
    }

    async fn expire_pending_orders(&self) -> MonitoringResult<()> {
        let expired = self
            .order_manager
            .expire_stale_pending(self.pending_ttl)
            .await
            .context(ExpirySnafu)?;

        if expired > 0 {
            info!(expired, "Cancelled unpaid orders past their deadline");
        }
        Ok(())
    }
}

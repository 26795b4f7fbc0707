//! Periodic housekeeping: purge finished orders past retention and expired admin sessions.

use crate::auth::SessionStore;
use crate::clients::OrderClient;
use crate::lifecycle::ShutdownHandle;
use crate::order_actor::OrderError;
use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub purged_orders: usize,
    pub expired_sessions: usize,
}

/// One housekeeping pass.
pub async fn run_maintenance(
    orders: &OrderClient,
    sessions: &SessionStore,
    retention: Duration,
) -> Result<MaintenanceReport, OrderError> {
    let expired_sessions = sessions.purge_expired();
    let purged_orders = orders.purge_finished(Utc::now() - retention).await?;
    Ok(MaintenanceReport {
        purged_orders,
        expired_sessions,
    })
}

/// Runs [`run_maintenance`] every `interval` until `shutdown` fires.
pub fn spawn(
    orders: OrderClient,
    sessions: SessionStore,
    retention: Duration,
    interval: std::time::Duration,
    shutdown: ShutdownHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so startup stays quiet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = ticker.tick() => {}
            }
            match run_maintenance(&orders, &sessions, retention).await {
                Ok(report) if report == MaintenanceReport::default() => {
                    debug!("Maintenance: nothing to do");
                }
                Ok(report) => info!(
                    purged_orders = report.purged_orders,
                    expired_sessions = report.expired_sessions,
                    "Maintenance pass"
                ),
                Err(e) => warn!(error = %e, "Maintenance pass failed"),
            }
        }
        debug!("Maintenance task stopped");
    })
}

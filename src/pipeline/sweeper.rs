//! Background task that polls outstanding tickets on an interval.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::orchestrator::Orchestrator;

/// Counters of a running sweeper.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweeperStats {
    pub sweeps: u64,
    pub documents_checked: u64,
    pub documents_resolved: u64,
}

/// Handle to a running ticket sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
    stats: Arc<Mutex<SweeperStats>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the current sweep to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }

    pub fn stats(&self) -> SweeperStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

/// Run [`Orchestrator::sweep_pending_tickets`] every `interval` until shut down.
///
/// The first sweep happens immediately.
pub fn spawn_ticket_sweeper(orchestrator: Orchestrator, interval: Duration) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let stats = Arc::new(Mutex::new(SweeperStats::default()));
    let task_stats = Arc::clone(&stats);

    let join = tokio::spawn(async move {
        tracing::info!(interval_ms = interval.as_millis() as u64, "ticket sweeper started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::info!("ticket sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = orchestrator.sweep_pending_tickets().await;
                    let resolved = report
                        .items
                        .iter()
                        .filter(|item| item.state.is_some_and(|s| !s.is_pending_ticket()))
                        .count();
                    if let Ok(mut stats) = task_stats.lock() {
                        stats.sweeps += 1;
                        stats.documents_checked += report.checked as u64;
                        stats.documents_resolved += resolved as u64;
                    }
                    if report.checked > 0 {
                        tracing::debug!(checked = report.checked, resolved, "ticket sweep done");
                    }
                }
            }
        }
    });

    SweeperHandle {
        shutdown: Some(shutdown_tx),
        join,
        stats,
    }
}

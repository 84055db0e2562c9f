use crate::cycle::{CycleReport, PollCycle};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Drives poll cycles on a fixed interval.
///
/// Cycles never overlap: a tick that fires while a cycle is still running is
/// skipped. A shutdown request during a cycle lets that cycle finish first.
pub struct Scheduler {
    cycle: Arc<PollCycle>,
    interval: Duration,
    run_immediately: bool,
}

impl Scheduler {
    pub fn new(cycle: Arc<PollCycle>, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            run_immediately: true,
        }
    }

    /// Whether the first cycle starts at once or after one interval
    pub fn with_run_immediately(mut self, run_immediately: bool) -> Self {
        self.run_immediately = run_immediately;
        self
    }

    /// Run until `shutdown` resolves; returns the number of completed cycles
    pub async fn run<F>(self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0;

        info!(
            "Scheduler started: {} sources every {:?}",
            self.cycle.sources().len(),
            self.interval
        );

        if self.run_immediately {
            let stop = self.run_cycle(shutdown.as_mut()).await;
            completed += 1;
            if stop {
                info!("Scheduler stopped after {} cycle(s)", completed);
                return completed;
            }
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            debug!(state = ?SchedulerState::Idle, "Waiting for next tick");

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.as_mut() => {
                    info!("Shutdown requested");
                    break;
                }
            }

            let stop = self.run_cycle(shutdown.as_mut()).await;
            completed += 1;
            if stop {
                break;
            }
        }

        info!("Scheduler stopped after {} cycle(s)", completed);
        completed
    }

    /// Returns true when shutdown was requested while the cycle ran
    async fn run_cycle<F>(&self, mut shutdown: Pin<&mut F>) -> bool
    where
        F: Future<Output = ()>,
    {
        debug!(state = ?SchedulerState::Running, "Starting poll cycle");

        let cycle = self.cycle.run(Utc::now());
        tokio::pin!(cycle);
        let mut stop = false;

        let report: CycleReport = loop {
            tokio::select! {
                biased;
                report = &mut cycle => break report,
                _ = shutdown.as_mut(), if !stop => {
                    warn!("Shutdown requested, finishing the current cycle first");
                    stop = true;
                }
            }
        };

        debug!("Cycle delivered {} item(s)", report.total_delivered());
        stop
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::SweepService;

/// Runs the reset sweep on a fixed interval or a cron expression.
pub struct Scheduler {
    sweep: SweepService,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(sweep: SweepService, config: SchedulerConfig) -> Self {
        Self {
            sweep,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    /// Run a single sweep immediately.
    pub async fn run_once(&self) -> Result<usize> {
        let stats = self
            .sweep
            .run()
            .await
            .map_err(|e| anyhow::anyhow!("Sweep failed: {e}"))?;
        Ok(stats.count)
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let sweep = self.sweep.clone();
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let sweep = sweep.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = sweep.run().await {
                    error!("Scheduled sweep failed: {}", e);
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.sweep_interval_minutes;

        info!("Scheduler running every {} minutes", interval_mins);

        let mut sweep_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            sweep_interval.tick().await;

            if !*self.running.read().await {
                break;
            }

            if let Err(e) = self.sweep.run().await {
                error!("Scheduled sweep failed: {}", e);
            }
        }

        Ok(())
    }
}

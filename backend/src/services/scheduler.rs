use crate::models::SyncTier;
use crate::services::sync_service::SyncService;
use anyhow::Result;
use log::info;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Cron expressions (with seconds) for each sync tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSchedules {
    pub new_uploads: String,
    pub stats_refresh: String,
    pub full_resync: String,
}

impl Default for SyncSchedules {
    fn default() -> Self {
        SyncSchedules {
            new_uploads: "0 */5 * * * *".to_string(),
            stats_refresh: "0 0 * * * *".to_string(),
            full_resync: "0 0 */6 * * *".to_string(),
        }
    }
}

impl SyncSchedules {
    pub fn for_tier(&self, tier: SyncTier) -> &str {
        match tier {
            SyncTier::NewUploads => &self.new_uploads,
            SyncTier::StatsRefresh => &self.stats_refresh,
            SyncTier::FullResync => &self.full_resync,
        }
    }
}

fn sync_job(schedule: &str, tier: SyncTier, sync: Arc<SyncService>) -> Result<Job> {
    // Runs may overlap; every write is an idempotent upsert or patch.
    let job = Job::new_async(schedule, move |_uuid, _l| {
        let sync = sync.clone();
        Box::pin(async move {
            let _ = sync.run_logged(tier).await;
        })
    })?;
    Ok(job)
}

pub async fn setup_sync_scheduler(
    sync: Arc<SyncService>,
    schedules: &SyncSchedules,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    for tier in SyncTier::ALL {
        let schedule = schedules.for_tier(tier);
        scheduler.add(sync_job(schedule, tier, sync.clone())?).await?;
        info!("Scheduled {} sync: {schedule}", tier.name());
    }

    scheduler.start().await?;
    info!("Sync scheduler started.");

    Ok(scheduler)
}

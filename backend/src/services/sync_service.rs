use crate::error::SyncSkipped;
use crate::models::{ItemFields, SyncOutcome, SyncTier, TierReport, VideoRecord};
use crate::services::catalog::CatalogStore;
use crate::services::youtube_client::{ChannelRef, VideoProvider};
use crate::utils::new_video_ids;
use chrono::{Duration, Utc};
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// How many uploads the cheap new-upload check compares.
pub const QUICK_CHECK_WINDOW: usize = 5;
/// How many uploads a full resync pulls.
pub const FULL_RESYNC_WINDOW: u32 = 50;
/// Provider limit on ids per `videos` request.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Only videos younger than this get their stats refreshed.
pub fn stats_window() -> Duration {
    Duration::days(2)
}

/// Stats older than this are refreshed.
pub fn stats_max_age() -> Duration {
    Duration::hours(1)
}

pub struct SyncService {
    provider: Arc<dyn VideoProvider>,
    catalog: Arc<dyn CatalogStore>,
    channel: Option<ChannelRef>,
    reports: RwLock<HashMap<SyncTier, TierReport>>,
}

impl SyncService {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        catalog: Arc<dyn CatalogStore>,
        channel: Option<ChannelRef>,
    ) -> Self {
        SyncService {
            provider,
            catalog,
            channel,
            reports: RwLock::new(HashMap::new()),
        }
    }

    pub async fn run(&self, tier: SyncTier) -> Result<SyncOutcome, SyncSkipped> {
        match tier {
            SyncTier::NewUploads => self.check_new_uploads().await,
            SyncTier::StatsRefresh => self.refresh_stats().await,
            SyncTier::FullResync => self.full_resync().await,
        }
    }

    /// Run a tier and record/log how it went. Used by the scheduler, which
    /// has nowhere to send an error.
    pub async fn run_logged(&self, tier: SyncTier) -> Result<SyncOutcome, SyncSkipped> {
        let started = Utc::now();
        {
            let mut reports = self.reports.write().await;
            reports
                .entry(tier)
                .or_insert_with(|| empty_report(tier))
                .last_started = Some(started);
        }

        let result = self.run(tier).await;
        let summary = match &result {
            Ok(outcome) => {
                info!(
                    "Sync {} finished: examined {}, inserted {}, updated {}",
                    tier.name(),
                    outcome.examined,
                    outcome.inserted,
                    outcome.updated
                );
                format!(
                    "ok: examined {}, inserted {}, updated {}",
                    outcome.examined, outcome.inserted, outcome.updated
                )
            }
            Err(skip @ (SyncSkipped::Provider(_) | SyncSkipped::Store(_))) => {
                error!("Sync {} failed: {skip}", tier.name());
                format!("failed: {skip}")
            }
            Err(skip) => {
                warn!("Sync {} skipped: {skip}", tier.name());
                format!("skipped: {skip}")
            }
        };

        let mut reports = self.reports.write().await;
        let report = reports.entry(tier).or_insert_with(|| empty_report(tier));
        report.last_finished = Some(Utc::now());
        report.last_result = Some(summary);
        result
    }

    pub async fn reports(&self) -> Vec<TierReport> {
        let reports = self.reports.read().await;
        SyncTier::ALL
            .iter()
            .map(|tier| reports.get(tier).cloned().unwrap_or_else(|| empty_report(*tier)))
            .collect()
    }

    /// Tier 1: compare the newest uploads against the newest catalog entries
    /// and fetch full details only for unseen ids.
    pub async fn check_new_uploads(&self) -> Result<SyncOutcome, SyncSkipped> {
        info!("Checking for new uploads...");
        let playlist_id = self.uploads_playlist_id().await?;

        let fetched: Vec<String> = self
            .provider
            .list_playlist_items(&playlist_id, QUICK_CHECK_WINDOW as u32, ItemFields::Minimal)
            .await?
            .into_iter()
            .map(|item| item.video_id)
            .collect();
        let existing = self.catalog.recent_ids(QUICK_CHECK_WINDOW).await?;

        let new_ids = new_video_ids(&fetched, &existing);
        let mut outcome = SyncOutcome::idle(SyncTier::NewUploads);
        outcome.examined = fetched.len();
        if new_ids.is_empty() {
            info!("No new uploads.");
            return Ok(outcome);
        }

        info!("Found {} new upload(s): {}", new_ids.len(), new_ids.join(", "));
        let records = self.fetch_records(&new_ids).await?;
        let summary = self.catalog.upsert_many(records).await?;
        outcome.inserted = summary.inserted;
        outcome.updated = summary.updated;
        Ok(outcome)
    }

    /// Tier 2: refresh view/like/comment counts of recently published videos.
    pub async fn refresh_stats(&self) -> Result<SyncOutcome, SyncSkipped> {
        let now = Utc::now();
        let stale = self
            .catalog
            .stale(now - stats_window(), now - stats_max_age())
            .await?;

        let mut outcome = SyncOutcome::idle(SyncTier::StatsRefresh);
        if stale.is_empty() {
            info!("No videos need a stats refresh.");
            return Ok(outcome);
        }

        let ids: Vec<String> = stale.into_iter().map(|video| video.platform_video_id).collect();
        info!("Refreshing stats for {} video(s)", ids.len());
        outcome.examined = ids.len();

        for batch in ids.chunks(MAX_IDS_PER_REQUEST) {
            let stats = self.provider.video_statistics(batch).await?;
            let updated_at = Utc::now();
            let updates: Vec<_> = stats
                .into_iter()
                .map(|stat| stat.into_update(updated_at))
                .collect();
            outcome.updated += self.catalog.update_stats_only(&updates).await?;
        }
        Ok(outcome)
    }

    /// Tier 3: pull the latest uploads in full and overwrite what we have.
    pub async fn full_resync(&self) -> Result<SyncOutcome, SyncSkipped> {
        info!("Starting full resync...");
        let playlist_id = self.uploads_playlist_id().await?;

        let ids: Vec<String> = self
            .provider
            .list_playlist_items(&playlist_id, FULL_RESYNC_WINDOW, ItemFields::Snippet)
            .await?
            .into_iter()
            .map(|item| item.video_id)
            .collect();

        let mut outcome = SyncOutcome::idle(SyncTier::FullResync);
        outcome.examined = ids.len();
        if ids.is_empty() {
            warn!("Uploads playlist {playlist_id} returned no items");
            return Ok(outcome);
        }

        let records = self.fetch_records(&ids).await?;
        let summary = self.catalog.upsert_many(records).await?;
        outcome.inserted = summary.inserted;
        outcome.updated = summary.updated;
        Ok(outcome)
    }

    async fn uploads_playlist_id(&self) -> Result<String, SyncSkipped> {
        let channel = self.channel.as_ref().ok_or(SyncSkipped::MissingChannelRef)?;
        let channel_id = self
            .provider
            .resolve_channel_id(channel)
            .await?
            .ok_or_else(|| SyncSkipped::ChannelNotFound(channel.to_string()))?;

        self.provider
            .uploads_playlist_id(&channel_id)
            .await?
            .ok_or(SyncSkipped::NoUploadsPlaylist(channel_id))
    }

    /// Full details in provider order, stamped with one fetch time per batch.
    async fn fetch_records(&self, ids: &[String]) -> Result<Vec<VideoRecord>, SyncSkipped> {
        let mut records = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_IDS_PER_REQUEST) {
            let details = self.provider.video_details(batch).await?;
            let fetched_at = Utc::now();
            records.extend(details.into_iter().map(|video| video.into_record(fetched_at)));
        }
        Ok(records)
    }
}

fn empty_report(tier: SyncTier) -> TierReport {
    TierReport {
        tier,
        last_started: None,
        last_finished: None,
        last_result: None,
    }
}

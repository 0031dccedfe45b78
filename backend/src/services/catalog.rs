use crate::error::StoreError;
use crate::models::{StatsUpdate, UpsertSummary, VideoRecord};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The persisted video catalog, keyed by platform video id.
///
/// Each single write is atomic. Batches are best-effort and may be
/// partially applied if a write fails midway.
#[rocket::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert unknown ids, overwrite known ones. A stored `published_at` is kept.
    async fn upsert_many(&self, records: Vec<VideoRecord>) -> Result<UpsertSummary, StoreError>;

    /// Patch counts and `stats_updated_at` only; unknown ids are skipped.
    async fn update_stats_only(&self, updates: &[StatsUpdate]) -> Result<usize, StoreError>;

    /// Platform ids of the `limit` most recently published videos.
    async fn recent_ids(&self, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Published at or after `published_after` and never stats-refreshed or
    /// refreshed before `stats_updated_before`.
    async fn stale(
        &self,
        published_after: DateTime<Utc>,
        stats_updated_before: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, StoreError>;

    async fn get(&self, platform_video_id: &str) -> Result<Option<VideoRecord>, StoreError>;

    /// Every record, newest publish first.
    async fn all_by_published_desc(&self) -> Result<Vec<VideoRecord>, StoreError>;

    async fn top_by_views(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError>;

    async fn recent(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Process-local catalog. Used when `CATALOG_BACKEND=memory` and in tests.
#[derive(Default)]
pub struct MemoryCatalog {
    videos: RwLock<HashMap<String, VideoRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_videos(videos: impl IntoIterator<Item = VideoRecord>) -> Self {
        let videos = videos
            .into_iter()
            .map(|video| (video.platform_video_id.clone(), video))
            .collect();
        MemoryCatalog {
            videos: RwLock::new(videos),
        }
    }

    async fn sorted_by<K: Ord>(&self, key: impl Fn(&VideoRecord) -> K) -> Vec<VideoRecord> {
        let videos = self.videos.read().await;
        let mut sorted: Vec<VideoRecord> = videos.values().cloned().collect();
        sorted.sort_by(|a, b| key(b).cmp(&key(a)));
        sorted
    }
}

#[rocket::async_trait]
impl CatalogStore for MemoryCatalog {
    async fn upsert_many(&self, records: Vec<VideoRecord>) -> Result<UpsertSummary, StoreError> {
        let mut summary = UpsertSummary::default();
        for mut record in records {
            let mut videos = self.videos.write().await;
            match videos.get(&record.platform_video_id) {
                Some(existing) => {
                    record.published_at = existing.published_at;
                    summary.updated += 1;
                    debug!("Updating video {}", record.platform_video_id);
                }
                None => {
                    summary.inserted += 1;
                    debug!("Inserting video {}", record.platform_video_id);
                }
            }
            videos.insert(record.platform_video_id.clone(), record);
        }
        Ok(summary)
    }

    async fn update_stats_only(&self, updates: &[StatsUpdate]) -> Result<usize, StoreError> {
        let mut patched = 0;
        for update in updates {
            let mut videos = self.videos.write().await;
            if let Some(video) = videos.get_mut(&update.platform_video_id) {
                video.view_count = update.view_count;
                video.like_count = update.like_count;
                video.comment_count = update.comment_count;
                video.stats_updated_at = Some(update.stats_updated_at);
                patched += 1;
            } else {
                debug!("Stats update for unknown video {}", update.platform_video_id);
            }
        }
        Ok(patched)
    }

    async fn recent_ids(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        Ok(self
            .recent(limit)
            .await?
            .into_iter()
            .map(|video| video.platform_video_id)
            .collect())
    }

    async fn stale(
        &self,
        published_after: DateTime<Utc>,
        stats_updated_before: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self
            .sorted_by(|video| video.published_at)
            .await
            .into_iter()
            .filter(|video| video.published_at >= published_after)
            .filter(|video| match video.stats_updated_at {
                None => true,
                Some(updated) => updated < stats_updated_before,
            })
            .collect())
    }

    async fn get(&self, platform_video_id: &str) -> Result<Option<VideoRecord>, StoreError> {
        Ok(self.videos.read().await.get(platform_video_id).cloned())
    }

    async fn all_by_published_desc(&self) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self.sorted_by(|video| video.published_at).await)
    }

    async fn top_by_views(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
        let mut videos = self.sorted_by(|video| video.view_count).await;
        videos.truncate(limit);
        Ok(videos)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
        let mut videos = self.sorted_by(|video| video.published_at).await;
        videos.truncate(limit);
        Ok(videos)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.videos.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn video(id: &str, title: &str, published_at: DateTime<Utc>) -> VideoRecord {
        VideoRecord {
            platform_video_id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            thumbnail_url: String::new(),
            thumbnail_high_res_url: String::new(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            duration_iso8601: None,
            published_at,
            fetched_at: published_at,
            stats_updated_at: None,
            tags: Vec::new(),
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn upsert_twice_keeps_one_record_with_latest_fields() {
        let catalog = MemoryCatalog::new();
        let first = catalog.upsert_many(vec![video("v1", "first", at(1))]).await.unwrap();
        let second = catalog.upsert_many(vec![video("v1", "second", at(1))]).await.unwrap();

        assert_eq!(first, UpsertSummary { inserted: 1, updated: 0 });
        assert_eq!(second, UpsertSummary { inserted: 0, updated: 1 });
        assert_eq!(catalog.count().await.unwrap(), 1);
        assert_eq!(catalog.get("v1").await.unwrap().unwrap().title, "second");
    }

    #[tokio::test]
    async fn upsert_never_moves_published_at() {
        let catalog = MemoryCatalog::with_videos([video("v1", "a", at(1))]);
        catalog.upsert_many(vec![video("v1", "a", at(9))]).await.unwrap();
        assert_eq!(catalog.get("v1").await.unwrap().unwrap().published_at, at(1));
    }

    #[tokio::test]
    async fn stats_patch_leaves_other_fields_alone() {
        let catalog = MemoryCatalog::with_videos([video("v1", "A", at(1))]);
        let now = at(2);
        let patched = catalog
            .update_stats_only(&[
                StatsUpdate {
                    platform_video_id: "v1".into(),
                    view_count: 10,
                    like_count: 2,
                    comment_count: 1,
                    stats_updated_at: now,
                },
                StatsUpdate {
                    platform_video_id: "missing".into(),
                    view_count: 99,
                    like_count: 0,
                    comment_count: 0,
                    stats_updated_at: now,
                },
            ])
            .await
            .unwrap();

        assert_eq!(patched, 1);
        let stored = catalog.get("v1").await.unwrap().unwrap();
        assert_eq!(stored.title, "A");
        assert_eq!(stored.view_count, 10);
        assert_eq!(stored.stats_updated_at, Some(now));
        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_ids_are_newest_first() {
        let catalog = MemoryCatalog::with_videos([
            video("old", "", at(1)),
            video("new", "", at(3)),
            video("mid", "", at(2)),
        ]);
        assert_eq!(catalog.recent_ids(2).await.unwrap(), vec!["new", "mid"]);
    }

    #[tokio::test]
    async fn stale_window_selection() {
        let now = at(10);
        let mut fresh = video("fresh", "", now - Duration::hours(5));
        fresh.stats_updated_at = Some(now - Duration::minutes(10));
        let mut outdated = video("outdated", "", now - Duration::hours(30));
        outdated.stats_updated_at = Some(now - Duration::hours(2));
        let never = video("never", "", now - Duration::hours(1));
        let too_old = video("too-old", "", now - Duration::days(3));

        let catalog = MemoryCatalog::with_videos([fresh, outdated, never, too_old]);
        let stale: Vec<String> = catalog
            .stale(now - Duration::days(2), now - Duration::hours(1))
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.platform_video_id)
            .collect();

        assert_eq!(stale, vec!["never", "outdated"]);
    }

    #[tokio::test]
    async fn top_by_views_sorts_descending() {
        let mut a = video("a", "", at(1));
        a.view_count = 5;
        let mut b = video("b", "", at(2));
        b.view_count = 50;
        let catalog = MemoryCatalog::with_videos([a, b]);
        let top = catalog.top_by_views(1).await.unwrap();
        assert_eq!(top[0].platform_video_id, "b");
    }
}

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use fansite_backend::error::ProviderError;
use fansite_backend::models::{ItemFields, PlaylistItem, VideoDetails, VideoRecord, VideoStats};
use fansite_backend::services::youtube_client::{ChannelRef, VideoProvider};
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted stand-in for the YouTube API that records what it was asked.
#[derive(Default)]
pub struct FakeProvider {
    pub channel_id: Option<String>,
    pub uploads_playlist: Option<String>,
    pub playlist: Vec<String>,
    pub details: HashMap<String, VideoDetails>,
    pub stats: HashMap<String, VideoStats>,
    pub list_calls: Mutex<Vec<(u32, ItemFields)>>,
    pub detail_calls: Mutex<Vec<Vec<String>>>,
    pub stats_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeProvider {
    /// Channel `@chan` resolves to `UC1` whose uploads playlist is `UU1`.
    pub fn for_channel() -> Self {
        FakeProvider {
            channel_id: Some("UC1".to_string()),
            uploads_playlist: Some("UU1".to_string()),
            ..Default::default()
        }
    }

    /// Uploads in provider order, newest first.
    pub fn with_uploads(mut self, uploads: Vec<VideoDetails>) -> Self {
        for video in uploads {
            self.playlist.push(video.platform_video_id.clone());
            self.details.insert(video.platform_video_id.clone(), video);
        }
        self
    }

    pub fn with_stats(mut self, id: &str, views: u64, likes: u64, comments: u64) -> Self {
        self.stats.insert(
            id.to_string(),
            VideoStats {
                platform_video_id: id.to_string(),
                view_count: views,
                like_count: likes,
                comment_count: comments,
            },
        );
        self
    }

    pub fn detail_calls(&self) -> Vec<Vec<String>> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn stats_calls(&self) -> Vec<Vec<String>> {
        self.stats_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<(u32, ItemFields)> {
        self.list_calls.lock().unwrap().clone()
    }
}

#[rocket::async_trait]
impl VideoProvider for FakeProvider {
    async fn resolve_channel_id(&self, channel: &ChannelRef) -> Result<Option<String>, ProviderError> {
        Ok(match channel {
            ChannelRef::Id(id) => Some(id.clone()),
            ChannelRef::Handle(_) => self.channel_id.clone(),
        })
    }

    async fn uploads_playlist_id(&self, _channel_id: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.uploads_playlist.clone())
    }

    async fn list_playlist_items(
        &self,
        _playlist_id: &str,
        max_results: u32,
        fields: ItemFields,
    ) -> Result<Vec<PlaylistItem>, ProviderError> {
        self.list_calls.lock().unwrap().push((max_results, fields));
        Ok(self
            .playlist
            .iter()
            .take(max_results as usize)
            .map(|id| PlaylistItem {
                video_id: id.clone(),
                published_at: self.details.get(id).map(|d| d.published_at),
            })
            .collect())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ProviderError> {
        self.detail_calls.lock().unwrap().push(video_ids.to_vec());
        Ok(video_ids
            .iter()
            .filter_map(|id| self.details.get(id).cloned())
            .collect())
    }

    async fn video_statistics(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, ProviderError> {
        self.stats_calls.lock().unwrap().push(video_ids.to_vec());
        Ok(video_ids
            .iter()
            .filter_map(|id| self.stats.get(id).cloned())
            .collect())
    }
}

pub fn details(id: &str, title: &str, published_at: DateTime<Utc>) -> VideoDetails {
    VideoDetails {
        platform_video_id: id.to_string(),
        title: title.to_string(),
        description: format!("{title} description"),
        thumbnail_url: format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
        thumbnail_high_res_url: format!("https://i.ytimg.com/vi/{id}/maxresdefault.jpg"),
        view_count: 100,
        like_count: 10,
        comment_count: 1,
        duration_iso8601: Some("PT10M".to_string()),
        published_at,
        tags: vec!["fans".to_string()],
    }
}

pub fn record(id: &str, title: &str, published_at: DateTime<Utc>) -> VideoRecord {
    details(id, title, published_at).into_record(published_at + Duration::minutes(1))
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

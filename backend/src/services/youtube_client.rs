use crate::error::{ConfigError, ProviderError};
use crate::models::{ItemFields, PlaylistItem, VideoDetails, VideoStats};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Where the channel to sync comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    /// Handle without the leading `@`.
    Handle(String),
}

impl ChannelRef {
    /// Accepts `@handle`, a raw channel id, or a channel URL in either
    /// `/channel/<id>` or `/@<handle>` form.
    pub fn parse(input: &str) -> Result<ChannelRef, ConfigError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConfigError::InvalidChannelRef(input.to_string()));
        }

        if let Some(handle) = input.strip_prefix('@') {
            return non_empty(handle).map(|h| ChannelRef::Handle(h.to_string()));
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            let url =
                Url::parse(input).map_err(|_| ConfigError::InvalidChannelRef(input.to_string()))?;
            let mut segments = url.path_segments().into_iter().flatten();
            return match segments.next() {
                Some("channel") => segments
                    .next()
                    .and_then(|id| non_empty(id).ok())
                    .map(|id| ChannelRef::Id(id.to_string()))
                    .ok_or_else(|| ConfigError::InvalidChannelRef(input.to_string())),
                Some(segment) if segment.starts_with('@') => {
                    non_empty(&segment[1..]).map(|h| ChannelRef::Handle(h.to_string()))
                }
                _ => Err(ConfigError::InvalidChannelRef(input.to_string())),
            };
        }

        Ok(ChannelRef::Id(input.to_string()))
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Id(id) => f.write_str(id),
            ChannelRef::Handle(handle) => write!(f, "@{handle}"),
        }
    }
}

fn non_empty(value: &str) -> Result<&str, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::InvalidChannelRef(value.to_string()))
    } else {
        Ok(value)
    }
}

/// Outbound calls to the video platform. No state beyond credentials.
#[rocket::async_trait]
pub trait VideoProvider: Send + Sync {
    async fn resolve_channel_id(&self, channel: &ChannelRef) -> Result<Option<String>, ProviderError>;

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, ProviderError>;

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        fields: ItemFields,
    ) -> Result<Vec<PlaylistItem>, ProviderError>;

    /// One request for all ids; callers keep batches at 50 or fewer.
    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ProviderError>;

    async fn video_statistics(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, ProviderError>;
}

pub struct YouTubeClient {
    http: Client,
    api_key: String,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        YouTubeClient {
            http: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    // Documentation: https://developers.google.com/youtube/v3/docs
    async fn get_json(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", self.api_base, endpoint);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!("Malformed JSON from YouTube {endpoint}: {e}");
            Value::Null
        }))
    }
}

#[rocket::async_trait]
impl VideoProvider for YouTubeClient {
    async fn resolve_channel_id(&self, channel: &ChannelRef) -> Result<Option<String>, ProviderError> {
        if let ChannelRef::Id(id) = channel {
            return Ok(Some(id.clone()));
        }
        let handle = channel.to_string();

        let response = self
            .get_json(
                "search",
                &[("part", "id"), ("q", handle.as_str()), ("type", "channel")],
            )
            .await?;

        let channel_id = response["items"][0]["id"]["channelId"]
            .as_str()
            .map(String::from);
        if channel_id.is_none() {
            warn!("Could not find channel ID for {handle}");
        }
        Ok(channel_id)
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .get_json(
                "channels",
                &[("part", "contentDetails"), ("id", channel_id)],
            )
            .await?;

        Ok(
            response["items"][0]["contentDetails"]["relatedPlaylists"]["uploads"]
                .as_str()
                .map(String::from),
        )
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        fields: ItemFields,
    ) -> Result<Vec<PlaylistItem>, ProviderError> {
        let max_results = max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if fields == ItemFields::Minimal {
            params.push(("fields", "items(snippet(resourceId/videoId,publishedAt))"));
        }

        let response = self.get_json("playlistItems", &params).await?;
        Ok(parse_playlist_items(&response))
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ProviderError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = video_ids.join(",");
        let response = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", ids.as_str())],
            )
            .await?;
        Ok(parse_video_details(&response))
    }

    async fn video_statistics(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, ProviderError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = video_ids.join(",");
        let response = self
            .get_json("videos", &[("part", "statistics"), ("id", ids.as_str())])
            .await?;
        Ok(parse_video_statistics(&response))
    }
}

fn items(response: &Value) -> &[Value] {
    response["items"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str()?.parse::<DateTime<Utc>>().ok()
}

/// Counts arrive as decimal strings. Only the leading digits are read, and a
/// missing value or one without leading digits is zero.
fn count_field(statistics: &Value, key: &str) -> u64 {
    match &statistics[key] {
        Value::String(s) => {
            let s = s.trim_start();
            let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
            s[..end].parse().unwrap_or(0)
        }
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

pub fn parse_playlist_items(response: &Value) -> Vec<PlaylistItem> {
    items(response)
        .iter()
        .filter_map(|item| {
            let snippet = &item["snippet"];
            let video_id = snippet["resourceId"]["videoId"].as_str()?;
            Some(PlaylistItem {
                video_id: video_id.to_string(),
                published_at: parse_timestamp(&snippet["publishedAt"]),
            })
        })
        .collect()
}

pub fn parse_video_details(response: &Value) -> Vec<VideoDetails> {
    let mut videos = Vec::new();
    for item in items(response) {
        let Some(video_id) = item["id"].as_str() else {
            warn!("Skipping video item without id");
            continue;
        };
        let snippet = &item["snippet"];
        let Some(published_at) = parse_timestamp(&snippet["publishedAt"]) else {
            warn!("Skipping video {video_id}: missing or invalid publishedAt");
            continue;
        };

        let thumbnails = &snippet["thumbnails"];
        let thumb = |size: &str| thumbnails[size]["url"].as_str().map(String::from);
        let thumbnail_url = thumb("medium").or_else(|| thumb("default")).unwrap_or_default();
        let thumbnail_high_res_url = thumb("maxres")
            .or_else(|| thumb("high"))
            .unwrap_or_else(|| thumbnail_url.clone());

        let statistics = &item["statistics"];
        videos.push(VideoDetails {
            platform_video_id: video_id.to_string(),
            title: snippet["title"].as_str().unwrap_or("").to_string(),
            description: snippet["description"].as_str().unwrap_or("").to_string(),
            thumbnail_url,
            thumbnail_high_res_url,
            view_count: count_field(statistics, "viewCount"),
            like_count: count_field(statistics, "likeCount"),
            comment_count: count_field(statistics, "commentCount"),
            duration_iso8601: item["contentDetails"]["duration"].as_str().map(String::from),
            published_at,
            tags: snippet["tags"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        });
    }
    debug!("Parsed {} video detail items", videos.len());
    videos
}

pub fn parse_video_statistics(response: &Value) -> Vec<VideoStats> {
    items(response)
        .iter()
        .filter_map(|item| {
            let video_id = item["id"].as_str()?;
            let statistics = &item["statistics"];
            Some(VideoStats {
                platform_video_id: video_id.to_string(),
                view_count: count_field(statistics, "viewCount"),
                like_count: count_field(statistics, "likeCount"),
                comment_count: count_field(statistics, "commentCount"),
            })
        })
        .collect()
}

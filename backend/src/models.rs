use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminToken(pub String);

/// One catalog entry per YouTube video id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub platform_video_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub thumbnail_url: String,
    pub thumbnail_high_res_url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    #[serde(default)]
    pub duration_iso8601: Option<String>, // e.g. PT15M33S
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub stats_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Full metadata as returned by `videos?part=snippet,statistics,contentDetails`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub platform_video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub thumbnail_high_res_url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub duration_iso8601: Option<String>,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl VideoDetails {
    /// A full ingest refreshes both freshness stamps.
    pub fn into_record(self, now: DateTime<Utc>) -> VideoRecord {
        VideoRecord {
            platform_video_id: self.platform_video_id,
            title: self.title,
            description: self.description,
            thumbnail_url: self.thumbnail_url,
            thumbnail_high_res_url: self.thumbnail_high_res_url,
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            duration_iso8601: self.duration_iso8601,
            published_at: self.published_at,
            fetched_at: now,
            stats_updated_at: Some(now),
            tags: self.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStats {
    pub platform_video_id: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

impl VideoStats {
    pub fn into_update(self, now: DateTime<Utc>) -> StatsUpdate {
        StatsUpdate {
            platform_video_id: self.platform_video_id,
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            stats_updated_at: now,
        }
    }
}

/// The only fields a stats refresh may touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsUpdate {
    pub platform_video_id: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub stats_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub video_id: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// How much of each playlist item to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFields {
    /// Only `resourceId/videoId` and `publishedAt`.
    Minimal,
    Snippet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Short,
    Video,
}

impl FromStr for VideoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(VideoKind::Short),
            "video" => Ok(VideoKind::Video),
            other => Err(format!("unknown video type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub limit: usize,
    pub offset: usize,
    pub search: Option<String>,
    pub kind: Option<VideoKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTier {
    NewUploads,
    StatsRefresh,
    FullResync,
}

impl SyncTier {
    pub const ALL: [SyncTier; 3] = [
        SyncTier::NewUploads,
        SyncTier::StatsRefresh,
        SyncTier::FullResync,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SyncTier::NewUploads => "new-uploads",
            SyncTier::StatsRefresh => "stats-refresh",
            SyncTier::FullResync => "full-resync",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub tier: SyncTier,
    /// Provider items looked at in this run.
    pub examined: usize,
    pub inserted: usize,
    pub updated: usize,
}

impl SyncOutcome {
    pub fn idle(tier: SyncTier) -> Self {
        SyncOutcome {
            tier,
            examined: 0,
            inserted: 0,
            updated: 0,
        }
    }

    pub fn found_new(&self) -> bool {
        self.inserted > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: SyncTier,
    pub last_started: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
    pub last_result: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunResponse {
    Completed(SyncOutcome),
    Skipped(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoCountResponse {
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: Status,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        ErrorResponse {
            status,
            error: status.reason_lossy().to_string(),
            message: message.into(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status;
        (status, Json(self)).respond_to(request)
    }
}

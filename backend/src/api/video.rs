use crate::models::{ErrorResponse, ListQuery, VideoCountResponse, VideoKind, VideoRecord};
use crate::services::video_service::{self, DEFAULT_PAGE_SIZE, DEFAULT_TOP_LIMIT};
use crate::AppState;
use log::{error, info};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use std::fmt::Display;

fn internal_error(context: &str, e: impl Display) -> ErrorResponse {
    error!("{context}: {e}");
    ErrorResponse::new(Status::InternalServerError, context)
}

#[get("/?<limit>&<offset>&<search>&<type>")]
pub async fn list_videos(
    limit: Option<usize>,
    offset: Option<usize>,
    search: Option<String>,
    r#type: Option<String>,
    state: &State<AppState>,
) -> Result<Json<Vec<VideoRecord>>, ErrorResponse> {
    let kind = r#type
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::parse::<VideoKind>)
        .transpose()
        .map_err(|e| ErrorResponse::new(Status::BadRequest, e))?;

    let query = ListQuery {
        limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
        offset: offset.unwrap_or(0),
        search,
        kind,
    };

    match video_service::list_videos(state.catalog.as_ref(), &query).await {
        Ok(videos) => {
            info!("Listing {} videos.", videos.len());
            Ok(Json(videos))
        }
        Err(e) => Err(internal_error("Failed to list videos", e)),
    }
}

#[get("/most-viewed?<limit>")]
pub async fn most_viewed(
    limit: Option<usize>,
    state: &State<AppState>,
) -> Result<Json<Vec<VideoRecord>>, ErrorResponse> {
    video_service::most_viewed(state.catalog.as_ref(), limit.unwrap_or(DEFAULT_TOP_LIMIT))
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to load most viewed videos", e))
}

#[get("/recent?<limit>")]
pub async fn recent_videos(
    limit: Option<usize>,
    state: &State<AppState>,
) -> Result<Json<Vec<VideoRecord>>, ErrorResponse> {
    video_service::recent(state.catalog.as_ref(), limit.unwrap_or(DEFAULT_TOP_LIMIT))
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to load recent videos", e))
}

#[get("/count")]
pub async fn count_videos(state: &State<AppState>) -> Result<Json<VideoCountResponse>, ErrorResponse> {
    video_service::count(state.catalog.as_ref())
        .await
        .map(|total| Json(VideoCountResponse { total }))
        .map_err(|e| internal_error("Failed to count videos", e))
}

#[get("/<id>")]
pub async fn get_video(id: &str, state: &State<AppState>) -> Result<Json<VideoRecord>, ErrorResponse> {
    match video_service::get_by_platform_id(state.catalog.as_ref(), id).await {
        Ok(Some(video)) => Ok(Json(video)),
        Ok(None) => Err(ErrorResponse::new(
            Status::NotFound,
            format!("No video with id {id}"),
        )),
        Err(e) => Err(internal_error("Failed to fetch video", e)),
    }
}

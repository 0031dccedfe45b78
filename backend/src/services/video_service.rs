use crate::error::StoreError;
use crate::models::{ListQuery, VideoRecord};
use crate::services::catalog::CatalogStore;
use crate::utils::{classify_video, matches_search};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_TOP_LIMIT: usize = 5;

/// Newest-first listing with optional search and short/long filter, then
/// `[offset, offset + limit)`.
pub async fn list_videos(
    catalog: &dyn CatalogStore,
    query: &ListQuery,
) -> Result<Vec<VideoRecord>, StoreError> {
    let videos = catalog.all_by_published_desc().await?;
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    Ok(videos
        .into_iter()
        .filter(|video| search.map_or(true, |s| matches_search(&video.title, &video.description, s)))
        .filter(|video| match query.kind {
            None => true,
            Some(kind) => {
                classify_video(&video.title, video.duration_iso8601.as_deref()) == Some(kind)
            }
        })
        .skip(query.offset)
        .take(query.limit)
        .collect())
}

pub async fn most_viewed(
    catalog: &dyn CatalogStore,
    limit: usize,
) -> Result<Vec<VideoRecord>, StoreError> {
    catalog.top_by_views(limit).await
}

pub async fn recent(catalog: &dyn CatalogStore, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
    catalog.recent(limit).await
}

pub async fn count(catalog: &dyn CatalogStore) -> Result<u64, StoreError> {
    catalog.count().await
}

pub async fn get_by_platform_id(
    catalog: &dyn CatalogStore,
    platform_video_id: &str,
) -> Result<Option<VideoRecord>, StoreError> {
    catalog.get(platform_video_id).await
}

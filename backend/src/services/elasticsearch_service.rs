use crate::error::StoreError;
use crate::models::{StatsUpdate, UpsertSummary, VideoRecord};
use crate::services::catalog::CatalogStore;
use chrono::{DateTime, Utc};
use elasticsearch::http::response::Response;
use elasticsearch::indices::IndicesCreateParts;
use elasticsearch::{CountParts, Elasticsearch, GetParts, IndexParts, SearchParts, UpdateParts};
use log::{debug, error, info, warn};
use serde_json::{json, Value};

pub const VIDEO_INDEX: &str = "youtube_videos";

/// Elasticsearch's default `index.max_result_window`; no search may ask for more.
const MAX_SCAN: usize = 10000;

pub async fn create_es_index(es_client: &Elasticsearch) {
    let create_index_body = json!({
        "mappings": {
            "properties": {
                "platform_video_id": { "type": "keyword" },
                "title": { "type": "text" },
                "description": { "type": "text" },
                "thumbnail_url": { "type": "keyword", "index": false },
                "thumbnail_high_res_url": { "type": "keyword", "index": false },
                "view_count": { "type": "long" },
                "like_count": { "type": "long" },
                "comment_count": { "type": "long" },
                "duration_iso8601": { "type": "keyword" },
                "published_at": { "type": "date" },
                "fetched_at": { "type": "date" },
                "stats_updated_at": { "type": "date" },
                "tags": { "type": "keyword" }
            }
        }
    });

    match es_client
        .indices()
        .create(IndicesCreateParts::Index(VIDEO_INDEX))
        .body(create_index_body)
        .send()
        .await
    {
        Ok(response) => {
            if response.status_code().is_success() {
                info!("Elasticsearch index '{VIDEO_INDEX}' created.");
            } else {
                let response_text = response.text().await.unwrap_or_default();
                if response_text.contains("resource_already_exists_exception") {
                    info!("Elasticsearch index '{VIDEO_INDEX}' already exists.");
                } else {
                    error!("Failed to create Elasticsearch index: {response_text}");
                }
            }
        }
        Err(e) => {
            error!("Failed to connect to Elasticsearch to create index: {e:?}");
        }
    }
}

pub struct ElasticsearchCatalog {
    es_client: Elasticsearch,
}

impl ElasticsearchCatalog {
    pub fn new(es_client: Elasticsearch) -> Self {
        ElasticsearchCatalog { es_client }
    }

    async fn search(&self, body: Value) -> Result<Value, StoreError> {
        let response = self
            .es_client
            .search(SearchParts::Index(&[VIDEO_INDEX]))
            .body(body)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json::<Value>().await?)
    }

    async fn search_videos(&self, body: Value) -> Result<Vec<VideoRecord>, StoreError> {
        let response = self.search(body).await?;
        hits(&response)
            .iter()
            .map(|hit| serde_json::from_value(hit["_source"].clone()).map_err(StoreError::from))
            .collect()
    }

    async fn sorted(&self, field: &str, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
        self.search_videos(sorted_query(field, limit)).await
    }
}

fn sorted_query(field: &str, limit: usize) -> Value {
    json!({
        "size": limit.min(MAX_SCAN),
        "query": { "match_all": {} },
        "sort": [{ field: { "order": "desc" } }]
    })
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status_code();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

fn hits(response: &Value) -> &[Value] {
    response["hits"]["hits"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[rocket::async_trait]
impl CatalogStore for ElasticsearchCatalog {
    async fn upsert_many(&self, records: Vec<VideoRecord>) -> Result<UpsertSummary, StoreError> {
        let mut summary = UpsertSummary::default();
        for mut record in records {
            let id = record.platform_video_id.clone();
            match self.get(&id).await? {
                Some(existing) => {
                    record.published_at = existing.published_at;
                    summary.updated += 1;
                    debug!("Updating video {id}");
                }
                None => {
                    summary.inserted += 1;
                    debug!("Inserting video {id}");
                }
            }

            let response = self
                .es_client
                .index(IndexParts::IndexId(VIDEO_INDEX, &id))
                .body(json!(record))
                .send()
                .await?;
            ensure_success(response).await?;
        }
        Ok(summary)
    }

    async fn update_stats_only(&self, updates: &[StatsUpdate]) -> Result<usize, StoreError> {
        let mut patched = 0;
        for update in updates {
            let response = self
                .es_client
                .update(UpdateParts::IndexId(VIDEO_INDEX, &update.platform_video_id))
                .body(json!({
                    "doc": {
                        "view_count": update.view_count,
                        "like_count": update.like_count,
                        "comment_count": update.comment_count,
                        "stats_updated_at": update.stats_updated_at
                    }
                }))
                .send()
                .await?;

            if response.status_code().as_u16() == 404 {
                debug!("Stats update for unknown video {}", update.platform_video_id);
                continue;
            }
            ensure_success(response).await?;
            patched += 1;
        }
        Ok(patched)
    }

    async fn recent_ids(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let response = self
            .search(json!({
                "size": limit,
                "query": { "match_all": {} },
                "sort": [{ "published_at": { "order": "desc" } }],
                "_source": false
            }))
            .await?;

        Ok(hits(&response)
            .iter()
            .filter_map(|hit| hit["_id"].as_str().map(String::from))
            .collect())
    }

    async fn stale(
        &self,
        published_after: DateTime<Utc>,
        stats_updated_before: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, StoreError> {
        self.search_videos(json!({
            "size": MAX_SCAN,
            "query": {
                "bool": {
                    "filter": [
                        { "range": { "published_at": { "gte": published_after } } }
                    ],
                    "should": [
                        { "bool": { "must_not": { "exists": { "field": "stats_updated_at" } } } },
                        { "range": { "stats_updated_at": { "lt": stats_updated_before } } }
                    ],
                    "minimum_should_match": 1
                }
            },
            "sort": [{ "published_at": { "order": "desc" } }]
        }))
        .await
    }

    async fn get(&self, platform_video_id: &str) -> Result<Option<VideoRecord>, StoreError> {
        let response = self
            .es_client
            .get(GetParts::IndexId(VIDEO_INDEX, platform_video_id))
            .send()
            .await?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }
        let body = ensure_success(response).await?.json::<Value>().await?;
        match body.get("_source") {
            Some(source) => Ok(Some(serde_json::from_value(source.clone())?)),
            None => Ok(None),
        }
    }

    async fn all_by_published_desc(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let videos = self.sorted("published_at", MAX_SCAN).await?;
        if videos.len() >= MAX_SCAN {
            warn!("Catalog scan stopped at {MAX_SCAN} videos; older videos are left out of listings");
        }
        Ok(videos)
    }

    async fn top_by_views(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
        self.sorted("view_count", limit).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
        self.sorted("published_at", limit).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let response = self
            .es_client
            .count(CountParts::Index(&[VIDEO_INDEX]))
            .send()
            .await?;
        let body = ensure_success(response).await?.json::<Value>().await?;
        Ok(body["count"].as_u64().unwrap_or(0))
    }
}

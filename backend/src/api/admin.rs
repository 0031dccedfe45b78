use crate::models::{AdminToken, ErrorResponse, SyncRunResponse, SyncTier, TierReport};
use crate::AppState;
use log::info;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};

async fn run_tier(
    state: &AppState,
    tier: SyncTier,
) -> Result<Json<SyncRunResponse>, ErrorResponse> {
    let sync = state.sync.as_ref().ok_or_else(|| {
        ErrorResponse::new(Status::ServiceUnavailable, "Video sync is not configured")
    })?;

    info!("Admin triggered {} sync", tier.name());
    match sync.run_logged(tier).await {
        Ok(outcome) => Ok(Json(SyncRunResponse::Completed(outcome))),
        Err(skipped) => Ok(Json(SyncRunResponse::Skipped(skipped.to_string()))),
    }
}

#[post("/sync/new-uploads")]
pub async fn sync_new_uploads(
    _token: AdminToken,
    state: &State<AppState>,
) -> Result<Json<SyncRunResponse>, ErrorResponse> {
    run_tier(state, SyncTier::NewUploads).await
}

#[post("/sync/stats")]
pub async fn sync_stats(
    _token: AdminToken,
    state: &State<AppState>,
) -> Result<Json<SyncRunResponse>, ErrorResponse> {
    run_tier(state, SyncTier::StatsRefresh).await
}

#[post("/sync/full")]
pub async fn sync_full(
    _token: AdminToken,
    state: &State<AppState>,
) -> Result<Json<SyncRunResponse>, ErrorResponse> {
    run_tier(state, SyncTier::FullResync).await
}

#[get("/sync/status")]
pub async fn sync_status(
    _token: AdminToken,
    state: &State<AppState>,
) -> Result<Json<Vec<TierReport>>, ErrorResponse> {
    match &state.sync {
        Some(sync) => Ok(Json(sync.reports().await)),
        None => Err(ErrorResponse::new(
            Status::ServiceUnavailable,
            "Video sync is not configured",
        )),
    }
}

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use rocket::{routes, Build, Rocket};
use services::catalog::CatalogStore;
use services::sync_service::SyncService;
use std::sync::Arc;

pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    /// `None` when the sync configuration was rejected at startup.
    pub sync: Option<Arc<SyncService>>,
    pub admin_token: Option<String>,
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount(
            "/videos",
            routes![
                api::list_videos,
                api::most_viewed,
                api::recent_videos,
                api::count_videos,
                api::get_video,
            ],
        )
        .mount(
            "/admin",
            routes![
                api::sync_new_uploads,
                api::sync_stats,
                api::sync_full,
                api::sync_status,
            ],
        )
}

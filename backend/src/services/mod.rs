pub mod catalog;
pub mod elasticsearch_service;
pub mod scheduler;
pub mod sync_service;
pub mod video_service;
pub mod youtube_client;

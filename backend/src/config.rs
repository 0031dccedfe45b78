use crate::error::ConfigError;
use crate::models::AdminToken;
use crate::services::catalog::{CatalogStore, MemoryCatalog};
use crate::services::elasticsearch_service::{create_es_index, ElasticsearchCatalog};
use crate::services::scheduler::{setup_sync_scheduler, SyncSchedules};
use crate::services::sync_service::SyncService;
use crate::services::youtube_client::{ChannelRef, YouTubeClient, DEFAULT_API_BASE};
use crate::AppState;
use anyhow::Result;
use elasticsearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch,
};
use env_logger::Builder;
use log::{error, info, LevelFilter};
use rocket::http::{Method, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::sync::Arc;
use tokio_cron_scheduler::JobScheduler;

pub const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";

/// Everything the sync tiers need, validated once at startup.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api_key: String,
    pub channel: Option<ChannelRef>,
    pub api_base: String,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var_string)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("PROVIDER_API_KEY")
            .or_else(|| lookup("YOUTUBE_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;
        let channel = lookup("PROVIDER_CHANNEL_REF")
            .or_else(|| lookup("YOUTUBE_CHANNEL_ID"))
            .map(|value| ChannelRef::parse(&value))
            .transpose()?;
        let api_base = lookup("YOUTUBE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(SyncConfig {
            api_key,
            channel,
            api_base,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Elasticsearch,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub elasticsearch_url: String,
    pub backend: CatalogBackend,
    pub admin_token: Option<String>,
    pub cors_origin: String,
    pub schedules: SyncSchedules,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var_string)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match lookup("CATALOG_BACKEND").as_deref() {
            None | Some("elasticsearch") => CatalogBackend::Elasticsearch,
            Some("memory") => CatalogBackend::Memory,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };
        let defaults = SyncSchedules::default();

        Ok(ServerConfig {
            elasticsearch_url: lookup("ELASTICSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_ELASTICSEARCH_URL.to_string()),
            backend,
            admin_token: lookup("ADMIN_TOKEN"),
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            schedules: SyncSchedules {
                new_uploads: lookup("NEW_UPLOAD_SCHEDULE").unwrap_or(defaults.new_uploads),
                stats_refresh: lookup("STATS_REFRESH_SCHEDULE").unwrap_or(defaults.stats_refresh),
                full_resync: lookup("FULL_RESYNC_SCHEDULE").unwrap_or(defaults.full_resync),
            },
        })
    }
}

/// Blank values count as unset.
fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting Rocket backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn create_elasticsearch_client(es_url: &str) -> Result<Elasticsearch> {
    info!("Connecting to Elasticsearch at: {es_url}");

    let transport =
        TransportBuilder::new(SingleNodeConnectionPool::new(es_url.parse()?)).build()?;

    Ok(Elasticsearch::new(transport))
}

pub async fn create_catalog(config: &ServerConfig) -> Result<Arc<dyn CatalogStore>> {
    match config.backend {
        CatalogBackend::Elasticsearch => {
            let es_client = create_elasticsearch_client(&config.elasticsearch_url)?;
            create_es_index(&es_client).await;
            Ok(Arc::new(ElasticsearchCatalog::new(es_client)))
        }
        CatalogBackend::Memory => {
            info!("Using in-memory video catalog.");
            Ok(Arc::new(MemoryCatalog::new()))
        }
    }
}

/// Builds the shared state. Without a usable sync configuration the server
/// still serves reads but nothing gets scheduled.
pub async fn create_app_state(config: &ServerConfig) -> Result<(AppState, Option<JobScheduler>)> {
    let catalog = create_catalog(config).await?;

    let sync = match SyncConfig::from_env() {
        Ok(sync_config) => {
            if sync_config.channel.is_none() {
                error!("PROVIDER_CHANNEL_REF is not set; new-upload and full-resync runs will be skipped");
            }
            let provider = Arc::new(YouTubeClient::new(sync_config.api_key, sync_config.api_base));
            Some(Arc::new(SyncService::new(
                provider,
                catalog.clone(),
                sync_config.channel,
            )))
        }
        Err(e) => {
            error!("Video sync disabled: {e}");
            None
        }
    };

    let scheduler = match &sync {
        Some(sync) => Some(setup_sync_scheduler(sync.clone(), &config.schedules).await?),
        None => None,
    };

    Ok((
        AppState {
            catalog,
            sync,
            admin_token: config.admin_token.clone(),
        },
        scheduler,
    ))
}

pub fn create_cors(origin: &str) -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[origin]))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&[
            "Authorization",
            "Accept",
            "Content-Type",
        ]))
        .allow_credentials(true)
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminToken {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let expected = match request.rocket().state::<AppState>() {
            Some(AppState {
                admin_token: Some(expected),
                ..
            }) => expected,
            _ => return Outcome::Error((Status::Unauthorized, "Admin access disabled")),
        };

        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|auth| auth.strip_prefix("Bearer "));

        match token {
            Some(t) => {
                if t == expected {
                    Outcome::Success(AdminToken(t.to_string()))
                } else {
                    Outcome::Error((Status::Unauthorized, "Invalid token"))
                }
            }
            None => Outcome::Error((Status::Unauthorized, "Missing token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn sync_config_requires_api_key() {
        let err = SyncConfig::from_lookup(lookup(&[("PROVIDER_CHANNEL_REF", "@chan")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn sync_config_falls_back_to_youtube_names() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("YOUTUBE_API_KEY", "k"),
            ("YOUTUBE_CHANNEL_ID", "UC123"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.channel, Some(ChannelRef::Id("UC123".into())));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn sync_config_channel_is_optional() {
        let config = SyncConfig::from_lookup(lookup(&[("PROVIDER_API_KEY", "k")])).unwrap();
        assert_eq!(config.channel, None);
    }

    #[test]
    fn sync_config_rejects_bad_channel() {
        let err = SyncConfig::from_lookup(lookup(&[
            ("PROVIDER_API_KEY", "k"),
            ("PROVIDER_CHANNEL_REF", "@"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChannelRef(_)));
    }

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, CatalogBackend::Elasticsearch);
        assert_eq!(config.elasticsearch_url, DEFAULT_ELASTICSEARCH_URL);
        assert_eq!(config.admin_token, None);
        assert_eq!(config.schedules, SyncSchedules::default());
    }

    #[test]
    fn server_config_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CATALOG_BACKEND", "memory"),
            ("ADMIN_TOKEN", "secret"),
            ("FULL_RESYNC_SCHEDULE", "0 0 3 * * *"),
        ]))
        .unwrap();
        assert_eq!(config.backend, CatalogBackend::Memory);
        assert_eq!(config.admin_token.as_deref(), Some("secret"));
        assert_eq!(config.schedules.full_resync, "0 0 3 * * *");
        assert_eq!(config.schedules.new_uploads, "0 */5 * * * *");
    }

    #[test]
    fn server_config_rejects_unknown_backend() {
        let err = ServerConfig::from_lookup(lookup(&[("CATALOG_BACKEND", "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(_)));
    }
}

use fansite_backend::build_rocket;
use fansite_backend::config::{
    create_app_state, create_cors, init_logger, load_environment, ServerConfig,
};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    load_environment();
    init_logger();

    let config = ServerConfig::from_env()?;
    let (state, _scheduler) = create_app_state(&config).await?;
    let cors = create_cors(&config.cors_origin)?;

    build_rocket(state)
        .attach(cors)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {e}"))?;
    Ok(())
}

use outfit_planner::{init_tracing, AppConfig, OutfitPlanner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_filter)?;

    let app = OutfitPlanner::bootstrap(config).await?;
    let navigator = app.navigator();
    tracing::info!(
        route = navigator.current().to_path(),
        signed_in = app.session().is_signed_in(),
        "landing screen resolved"
    );
    Ok(())
}

use teamgrid_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load .env if present, then configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize the application (telemetry, database, storage, routes)
    let (_state, router) = teamgrid_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    teamgrid_api::setup::server::start_server(&config, router).await?;

    Ok(())
}

use env::Env;
use eyre::Context;
use log::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env = Env::load()?;
    pretty_env_logger::formatted_builder()
        .parse_filters(env.rust_log())
        .init();
    color_eyre::install()?;

    info!("connecting to mongo");
    let storage = storage::Storage::new(env.mongo_url())
        .await
        .context("Failed to create storage")?;

    info!("starting background tasks");
    let mut scheduler = bg_process::start(storage, (&env).into())
        .await
        .context("Failed to start scheduler")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutting down");
    scheduler.shutdown().await?;
    Ok(())
}

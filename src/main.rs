use crate::config::Config;
use crate::startup::Application;
use crate::utils::logger::init_logger;
use anyhow::Context;

mod config;
mod database;
mod errors;
mod infrastructure;
mod models;
mod repositories;
mod server;
mod services;
mod startup;
#[cfg(test)]
mod testing;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();
    init_logger();

    log_info!("Starting eth-stream-relay...");

    let config = Config::load().context("Failed to load application configuration")?;

    let application = Application::build(config)
        .await
        .context("Application building failed (source URL / database / listener)")?;

    log_info!("Application build complete. Subscribing to upstream heads.");

    application
        .run()
        .await
        .context("Application core service failed during runtime")?;

    log_info!("eth-stream-relay stopped");
    Ok(())
}

use std::sync::Arc;

use chrono::Local;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod prompt;

use shared_config::ClientConfig;
use shared_gateway::{ApiClient, ApiGateway};
use shared_utils::{AlwaysConfirm, Confirm};

use commands::Command;
use prompt::StdinConfirm;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hms=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (flags, args): (Vec<String>, Vec<String>) = std::env::args().skip(1).partition(|a| a == "--yes");
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, commands::USAGE);
            std::process::exit(2);
        }
    };

    let config = ClientConfig::from_env();
    info!("Using API at {}", config.normalized_base_url());

    let gateway: Arc<dyn ApiGateway> = Arc::new(ApiClient::from_config(&config));
    let today = Local::now().date_naive();

    let confirm: Arc<dyn Confirm> = if flags.is_empty() {
        Arc::new(StdinConfirm)
    } else {
        Arc::new(AlwaysConfirm)
    };

    commands::run(command, gateway, confirm, today).await
}

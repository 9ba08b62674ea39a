use secret_courier::config::AppConfig;
use secret_courier::{observability, runner, APP_NAME, VERSION};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    observability::init_logging();
    info!(app_name = APP_NAME, version = VERSION, "Starting secret sync");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };
    info!(
        vault = %config.vault.address,
        namespace = %config.kubernetes.namespace,
        groups = config.groups.len(),
        "Loaded configuration from environment"
    );

    match runner::run(&config).await {
        Ok(summary) => {
            info!(synced = summary.synced, skipped = summary.skipped, "Run finished");
        }
        Err(err) => {
            error!(error = %err, "Sync failed");
            std::process::exit(1);
        }
    }
}

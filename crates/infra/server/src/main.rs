//! Ride Admin Server binary.
//!
//! ```text
//! ride-admin-server [serve | backfill-created-at] [--config <path>]
//! ```

use ride_admin_server::{load_config, AdminServer, AppConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "ride-admin.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut command = "serve".to_string();
    let mut config_path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config_path = Some(args.next().ok_or("--config needs a path")?);
            }
            other => command = other.to_string(),
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG).exists() => load_config(DEFAULT_CONFIG)?,
        None => AppConfig::default(),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server = AdminServer::new(config)?;
    match command.as_str() {
        "serve" => server.run().await?,
        "backfill-created-at" => {
            let updated = server.backfill_created_at().await?;
            tracing::info!(updated, "Backfill complete");
        }
        other => return Err(format!("unknown command '{other}'").into()),
    }

    Ok(())
}

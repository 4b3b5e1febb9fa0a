use ecoledger::app;
use ecoledger::config::ServerConfig;

/// Main entry point for the metrics web service
///
/// Reads configuration from the environment (`PORT`, `DATA_DIR`,
/// `REPORTING_CONFIG`) and runs the server until stopped.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::from_env()?;

    app::run(config).await
}

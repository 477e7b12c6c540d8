use std::env;
use std::error::Error;

use clap::Parser;

use xusbd::cli::{main_cli, Args, Commands};
use xusbd::config::Config;
use xusbd::input::manager::Manager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();

    let args = Args::parse();
    let config_path = match args.cmd {
        None => None,
        Some(Commands::Run { config }) => config,
        Some(cmd) => return main_cli(cmd),
    };

    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting xusbd v{}", VERSION);

    let config = Config::load(config_path.as_deref())?;
    log::debug!("Using config: {config:?}");

    let mut manager = Manager::new(config);
    if let Err(e) = manager.run().await {
        log::error!("Error running the input manager: {e}");
        return Err(e);
    }

    log::info!("xusbd stopped");

    Ok(())
}

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use playerwatch::cli::{Cli, Commands};
use playerwatch::{app, logging, Config, WatchError};

#[tokio::main]
async fn main() -> Result<(), WatchError> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle ConfigSample immediately without loading config
    if let Some(Commands::ConfigSample { output }) = &cli.command {
        let path = output
            .clone()
            .unwrap_or_else(|| PathBuf::from("./playerwatch.sample.yml"));
        Config::sample().save(&path)?;
        println!("sample config written to {:?}", path);
        return Ok(());
    }

    let log = logging::init(cli.debug);
    info!("playerwatch {}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    if config.debug && !cli.debug {
        log.set_debug(true);
    }

    app::run(config, app::termination_signal()).await
}

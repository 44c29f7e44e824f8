mod args;
mod config;
mod pipeline;
mod state;

use args::Args;
use clap::Parser;
use config::AppConfig;
use log::info;
use state::AppState;
use streamsql::env::ProcessEnv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    info!("run begins");
    let args = Args::parse();
    let app_config = AppConfig::load(&ProcessEnv, &args)?;
    info!(
        "Loaded {} source(s) from the environment",
        app_config.registry.len()
    );
    let state = AppState::new(app_config);

    if !args.skip_provision {
        pipeline::provision(&state).await?;
    }
    if !args.skip_consume {
        pipeline::consume(&state).await?;
    }

    info!("run ends");
    Ok(())
}

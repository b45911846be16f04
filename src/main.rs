//! chatrelay HTTP server
//!
//! Loads configuration once, refuses to start without a provider API key,
//! and serves the chat page and relay endpoint with Axum.

use chatrelay::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        match output {
            Some(path) => {
                std::fs::write(&path, generate_config_template())?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", generate_config_template()),
        }
        return Ok(());
    }

    // Missing credential or invalid settings stop the process here
    let config = Config::load(cli.config.as_deref().map(Path::new), cli.provider)?;

    telemetry::init(&config.observability.log_level);

    let addr = config.listen_addr()?;
    tracing::info!(
        provider = %config.provider.kind(),
        model = %config.provider.model(),
        base_url = %config.provider.base_url(),
        "Starting chatrelay on {}",
        addr
    );

    let state = AppState::new(config)?;
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("Chat page available at http://{}/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

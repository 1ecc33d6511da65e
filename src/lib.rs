pub mod app;
pub mod cli;
pub mod core;
pub mod flows;
pub mod schemas;
pub mod services;
pub mod store;
pub mod tasks;
pub mod views;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::app::App;
use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::gateway::HttpGateway;

pub async fn run() -> anyhow::Result<()> {
    run_with_args(std::env::args().skip(1)).await
}

/// Runs one command. Help is answered before configuration is validated.
pub async fn run_with_args<I>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = String>,
{
    dotenvy::dotenv().ok();

    let command = cli::parse_args(args)?;
    if command == cli::Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let gateway = Arc::new(HttpGateway::from_settings(&settings)?);
    tracing::debug!(
        environment = %settings.runtime().environment.as_str(),
        gateway_configured = !settings.gateway().url.is_empty(),
        ai_configured = !settings.ai().api_key.is_empty(),
        "Sports Day client starting"
    );
    let state = AppState::with_parts(settings, gateway, Arc::new(cli::TerminalNotifier))?;

    let mut app = App::new(state);
    cli::execute(&mut app, command).await
}

mod app;
mod cli;
pub use app::App;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = cli::Cli::parse().into_settings()?;
    let app = App::new(settings)?;
    app.run()?;

    Ok(())
}

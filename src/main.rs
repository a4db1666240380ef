use anyhow::Result;

use crate::cli::Cli;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    membership_console::telemetry::init();
    let config = membership_console::config::load()?;
    Cli::init().run(config).await
}

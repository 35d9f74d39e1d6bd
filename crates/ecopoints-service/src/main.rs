//! EcoPoints 运维工具入口

use clap::Parser;

use eco_shared::config::AppConfig;
use ecopoints::cli::{Cli, CommandRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load("ecopoints")?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    eco_shared::observability::init(&config.observability)?;

    let runner = CommandRunner::connect(config).await?;
    let result = runner.run(cli.command).await;
    runner.shutdown().await;

    result
}

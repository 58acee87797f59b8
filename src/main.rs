use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skimmer::cli::commands::{self, CrawlArgs};
use skimmer::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            urls,
            locales,
            method,
            user_agents,
            max_concurrency,
            compact,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let args = CrawlArgs {
                urls,
                locales,
                method,
                user_agents,
                max_concurrency,
                compact,
            };
            commands::crawl(config, args).await?;
        }
        Commands::InitConfig { force } => {
            commands::init_config(cli.config.as_deref(), force)?;
        }
    }

    Ok(())
}

use std::path::{Path, PathBuf};

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::domain::{BackendKind, CrawlRequest, InputList};

/// Command line overrides for a crawl.
#[derive(Debug, Default)]
pub struct CrawlArgs {
    pub urls: Vec<String>,
    pub locales: Vec<String>,
    pub method: Option<String>,
    pub user_agents: Option<PathBuf>,
    pub max_concurrency: Option<usize>,
    pub compact: bool,
}

/// Load the config named on the command line, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

pub async fn crawl(mut config: Config, args: CrawlArgs) -> Result<()> {
    if args.user_agents.is_some() {
        config.user_agents_file = args.user_agents;
    }
    if args.max_concurrency.is_some() {
        config.max_concurrency = args.max_concurrency;
    }

    let request = build_request(&config, args.urls, args.locales, args.method.as_deref())?;
    let ctx = AppContext::new(config)?;
    let result = ctx.crawl(&request).await?;

    println!("{}", result.to_json(!args.compact)?);
    Ok(())
}

pub fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };

    if path.exists() && !force {
        println!("Config already exists: {} (use --force to overwrite)", path.display());
        return Ok(());
    }

    Config::write_default(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

/// Flatten repeated and comma-joined arguments, falling back to config defaults.
fn build_request(
    config: &Config,
    urls: Vec<String>,
    locales: Vec<String>,
    method: Option<&str>,
) -> Result<CrawlRequest> {
    let urls = flatten(urls);
    let locales = match flatten(locales) {
        locales if locales.is_empty() => config.locales.clone(),
        locales => locales,
    };
    let backend: BackendKind = match method {
        Some(name) => name.parse()?,
        None => config.backend,
    };
    Ok(CrawlRequest::new(urls, locales, backend))
}

fn flatten(args: Vec<String>) -> Vec<String> {
    args.into_iter()
        .flat_map(|arg| InputList::from(arg).into_vec())
        .collect()
}

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skimmer")]
#[command(about = "Crawl product pages across locales", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/skimmer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl every url in every locale and print the results as JSON
    Crawl {
        /// Product page urls, comma separated or repeated
        #[arg(short, long, required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Locales to crawl each url in (default: from config)
        #[arg(short = 'l', long = "lang", num_args = 1..)]
        locales: Vec<String>,

        /// Backend: "browser" or "static" (default: from config)
        #[arg(short, long)]
        method: Option<String>,

        /// File with one user-agent per line
        #[arg(long)]
        user_agents: Option<PathBuf>,

        /// Maximum number of pages loaded at once
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Print the JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
